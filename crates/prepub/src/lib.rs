//! Library interface for the `prepub` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily for
//! documentation generation and testing. The actual entry point is in
//! `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The argument parser (clap derive)
//! - [`run`] - The checklist execution and rendering

pub mod run;

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, prepub=trace)
    PREPUB_LOG_PATH         Explicit log file path
    PREPUB_LOG_DIR          Log directory
    PREPUB_TEST_RUN         Mark a test run (skips the npm auth check)
";

/// Command-line interface definition for prepub.
#[derive(Parser)]
#[command(name = "prepub")]
#[command(about = "Preflight checks for publishing npm packages", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// How to bump: major, minor, patch, premajor, preminor, prepatch,
    /// prerelease, or an explicit semver version
    #[arg(id = "bump", value_name = "VERSION")]
    pub version: String,

    /// Publish under this dist-tag instead of `latest`
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Prefix for the release tag (default: npm's tag-version-prefix)
    #[arg(long, value_name = "PREFIX")]
    pub tag_prefix: Option<String>,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}
