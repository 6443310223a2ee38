//! The package manifest (`package.json`) as the checklist sees it.
//!
//! Only the fields the preflight checks consume are deserialized; everything
//! else in the manifest is ignored.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Name of the manifest file looked up in the package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors from locating or reading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No `package.json` in the package directory.
    #[error("no {file} found in {dir}", file = MANIFEST_FILE)]
    Missing {
        /// The directory that was searched.
        dir: Utf8PathBuf,
    },

    /// The manifest exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not valid JSON or is missing required fields.
    #[error("invalid {path}: {source}")]
    Parse {
        /// Path of the invalid file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// The fields of `package.json` consumed by the preflight checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name as published to the registry.
    pub name: String,
    /// Current published version.
    pub version: Version,
    /// Whether the package is marked private (never published).
    #[serde(default)]
    pub private: bool,
    /// Publish overrides, notably a non-default registry.
    #[serde(default)]
    pub publish_config: Option<PublishOverrides>,
}

/// The `publishConfig` section of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishOverrides {
    /// Registry URL the package publishes to instead of the default.
    pub registry: Option<String>,
}

impl PackageManifest {
    /// Load the manifest from `dir/package.json`.
    #[instrument(fields(%dir))]
    pub fn load(dir: &Utf8Path) -> ManifestResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::Missing {
                dir: dir.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let manifest: Self =
            serde_json::from_str(&raw).map_err(|source| ManifestError::Parse { path, source })?;

        debug!(name = %manifest.name, version = %manifest.version, "manifest loaded");
        Ok(manifest)
    }

    /// Whether the package publishes to a registry other than the default.
    pub fn is_external_registry(&self) -> bool {
        self.publish_config
            .as_ref()
            .is_some_and(|overrides| overrides.registry.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_tmp(tmp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(tmp.path()).expect("tempdir is UTF-8")
    }

    fn write_manifest(tmp: &TempDir, contents: &str) {
        fs::write(tmp.path().join(MANIFEST_FILE), contents).unwrap();
    }

    #[test]
    fn load_minimal_manifest() {
        let tmp = TempDir::new().unwrap();
        write_manifest(&tmp, r#"{"name": "unicorn", "version": "1.2.0"}"#);

        let manifest = PackageManifest::load(utf8_tmp(&tmp)).unwrap();
        assert_eq!(manifest.name, "unicorn");
        assert_eq!(manifest.version, Version::new(1, 2, 0));
        assert!(!manifest.private);
        assert!(!manifest.is_external_registry());
    }

    #[test]
    fn load_private_package() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            &tmp,
            r#"{"name": "internal-tool", "version": "0.3.1", "private": true}"#,
        );

        let manifest = PackageManifest::load(utf8_tmp(&tmp)).unwrap();
        assert!(manifest.private);
    }

    #[test]
    fn publish_config_registry_is_external() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            &tmp,
            r#"{
                "name": "corp-pkg",
                "version": "2.0.0",
                "publishConfig": {"registry": "https://registry.corp.example.com"}
            }"#,
        );

        let manifest = PackageManifest::load(utf8_tmp(&tmp)).unwrap();
        assert!(manifest.is_external_registry());
    }

    #[test]
    fn publish_config_without_registry_is_not_external() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            &tmp,
            r#"{"name": "pkg", "version": "1.0.0", "publishConfig": {}}"#,
        );

        let manifest = PackageManifest::load(utf8_tmp(&tmp)).unwrap();
        assert!(!manifest.is_external_registry());
    }

    #[test]
    fn missing_manifest() {
        let tmp = TempDir::new().unwrap();
        let err = PackageManifest::load(utf8_tmp(&tmp)).unwrap_err();
        assert!(matches!(err, ManifestError::Missing { .. }));
        assert!(err.to_string().contains(MANIFEST_FILE));
    }

    #[test]
    fn invalid_json() {
        let tmp = TempDir::new().unwrap();
        write_manifest(&tmp, "not json at all");

        let err = PackageManifest::load(utf8_tmp(&tmp)).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn invalid_version_field() {
        let tmp = TempDir::new().unwrap();
        write_manifest(&tmp, r#"{"name": "pkg", "version": "one.two"}"#);

        let err = PackageManifest::load(utf8_tmp(&tmp)).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            &tmp,
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "scripts": {"test": "ava"},
                "dependencies": {"meow": "^13.0.0"}
            }"#,
        );

        assert!(PackageManifest::load(utf8_tmp(&tmp)).is_ok());
    }
}
