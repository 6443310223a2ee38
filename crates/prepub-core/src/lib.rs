//! Core library for prepub.
//!
//! This crate builds and runs the preflight checklist that gates publishing
//! an npm package: registry reachability, tool versions, publish permission,
//! version-bump validity, pre-release tagging policy, and release-tag
//! collision.
//!
//! # Modules
//!
//! - [`checklist`] - The ordered preflight checks and their runner
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`git`] - Git operations consumed by the checks
//! - [`manifest`] - The `package.json` descriptor
//! - [`npm`] - npm operations consumed by the checks
//! - [`version`] - Bump tokens and next-version computation
//!
//! # Quick Start
//!
//! ```no_run
//! use prepub_core::checklist::{Checklist, Options};
//! use prepub_core::manifest::PackageManifest;
//!
//! let package = PackageManifest::load(camino::Utf8Path::new("."))
//!     .expect("no package.json here");
//! let checklist = Checklist::build("minor", package, Options::default());
//! let report = checklist.execute().expect("a preflight check failed");
//! println!("releasing {}", report.new_version);
//! ```
#![deny(unsafe_code)]

pub mod checklist;

pub mod config;

pub mod error;

pub mod git;

pub mod manifest;

pub mod npm;

pub mod version;

pub use checklist::{Checklist, ChecklistReport, Options};

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use manifest::PackageManifest;

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
