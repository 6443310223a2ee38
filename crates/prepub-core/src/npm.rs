//! npm operations for the preflight checks.
//!
//! Shells out to `npm` for all operations. This ensures we inherit the
//! user's authentication, proxy settings, and `.npmrc` configuration.

use std::collections::BTreeMap;
use std::process::Command;

use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument};

/// Minimum npm version required to publish safely.
///
/// 6.8.0 is the first release where `npm publish` honors `publishConfig.tag`,
/// which the rest of the release flow relies on.
pub const MIN_NPM_VERSION: Version = Version::new(6, 8, 0);

/// Errors from npm operations.
#[derive(Error, Debug)]
pub enum NpmError {
    /// Failed to execute the `npm` command.
    #[error("failed to run npm: {0}")]
    Exec(#[from] std::io::Error),

    /// `npm` returned a non-zero exit code.
    #[error("npm {command} failed: {stderr}")]
    Command {
        /// The npm subcommand that failed (e.g., "whoami").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// `npm` produced output we could not interpret.
    #[error("unexpected output from npm {command}: {detail}")]
    Output {
        /// The npm subcommand whose output was unusable.
        command: String,
        /// What went wrong while interpreting it.
        detail: String,
    },
}

/// Result alias for npm operations.
pub type NpmResult<T> = Result<T, NpmError>;

/// Collaborator permissions by username, as reported by the registry.
pub type Collaborators = BTreeMap<String, Vec<String>>;

/// Probe connectivity to the default npm registry.
#[instrument]
pub fn ping() -> NpmResult<()> {
    npm(&["ping"])?;
    debug!("registry reachable");
    Ok(())
}

/// The installed npm CLI version.
///
/// Parses the `npm` entry out of `npm version --json`.
#[instrument]
pub fn cli_version() -> NpmResult<Version> {
    let output = npm(&["version", "--json"])?;
    let version = parse_cli_version(&output)?;
    debug!(%version, "npm version");
    Ok(version)
}

/// The username npm is currently authenticated as.
#[instrument]
pub fn username() -> NpmResult<String> {
    let output = npm(&["whoami"])?;
    Ok(output.trim().to_string())
}

/// Collaborator permissions for a published package.
///
/// Returns `None` when the lookup fails, which is how the registry responds
/// for packages that have never been published. Callers treat absence as
/// "nothing to verify", not as an error.
#[instrument]
pub fn collaborators(package: &str) -> NpmResult<Option<Collaborators>> {
    match npm(&["access", "ls-collaborators", package]) {
        Ok(output) => parse_collaborators(&output).map(Some),
        Err(NpmError::Command { .. }) => {
            debug!(%package, "collaborators lookup failed, treating as unpublished");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// The configured git tag prefix (`npm config get tag-version-prefix`).
#[instrument]
pub fn tag_version_prefix() -> NpmResult<String> {
    let output = npm(&["config", "get", "tag-version-prefix"])?;
    Ok(output.trim().to_string())
}

/// Extract the CLI's own version from `npm version --json` output.
fn parse_cli_version(output: &str) -> NpmResult<Version> {
    let versions: BTreeMap<String, String> =
        serde_json::from_str(output).map_err(|e| NpmError::Output {
            command: "version".to_string(),
            detail: e.to_string(),
        })?;

    let raw = versions.get("npm").ok_or_else(|| NpmError::Output {
        command: "version".to_string(),
        detail: "no `npm` entry in version report".to_string(),
    })?;

    Version::parse(raw).map_err(|e| NpmError::Output {
        command: "version".to_string(),
        detail: format!("`{raw}` is not a semver version: {e}"),
    })
}

/// Parse the JSON permission map from `npm access ls-collaborators`.
fn parse_collaborators(output: &str) -> NpmResult<Collaborators> {
    serde_json::from_str(output).map_err(|e| NpmError::Output {
        command: "access".to_string(),
        detail: e.to_string(),
    })
}

/// Run an npm command and return its stdout.
fn npm(args: &[&str]) -> NpmResult<String> {
    let output = Command::new("npm").args(args).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(NpmError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}
