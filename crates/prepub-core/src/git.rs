//! Git operations for the preflight checks.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, credentials, and other configuration.

use std::process::Command;

use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument};

/// Minimum required git version.
///
/// 2.11.0 is where `git push --follow-tags` together with `--no-verify`
/// behaves the way the publish flow depends on.
pub const MIN_GIT_VERSION: Version = Version::new(2, 11, 0);

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "fetch").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// The installed git is older than [`MIN_GIT_VERSION`].
    #[error("installed git {found} is older than the required {minimum}")]
    TooOld {
        /// The version that was found.
        found: Version,
        /// The minimum required version.
        minimum: Version,
    },

    /// Could not extract a version from `git version` output.
    #[error("could not parse version from `git version` output: {output}")]
    VersionParse {
        /// The raw output that defeated the parser.
        output: String,
    },

    /// The `origin` remote is missing or unreachable.
    #[error("git remote `origin` is not valid: {stderr}")]
    InvalidRemote {
        /// git's own explanation.
        stderr: String,
    },
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// The installed git version.
#[instrument]
pub fn version() -> GitResult<Version> {
    let output = git(&["version"])?;
    let version = parse_version_output(&output).ok_or_else(|| GitError::VersionParse {
        output: output.trim().to_string(),
    })?;
    debug!(%version, "git version");
    Ok(version)
}

/// Fail unless the installed git meets [`MIN_GIT_VERSION`].
#[instrument]
pub fn verify_recent_version() -> GitResult<()> {
    let found = version()?;
    if found < MIN_GIT_VERSION {
        return Err(GitError::TooOld {
            found,
            minimum: MIN_GIT_VERSION,
        });
    }
    Ok(())
}

/// Fail unless the `origin` remote resolves and is reachable.
#[instrument]
pub fn verify_remote_is_valid() -> GitResult<()> {
    match git(&["ls-remote", "origin", "HEAD"]) {
        Ok(_) => Ok(()),
        Err(GitError::Command { stderr, .. }) => Err(GitError::InvalidRemote { stderr }),
        Err(e) => Err(e),
    }
}

/// Refresh local knowledge of the remote (branches and tags).
#[instrument]
pub fn fetch() -> GitResult<()> {
    git(&["fetch"])?;
    Ok(())
}

/// Whether a tag with this exact name is already known after a fetch.
#[instrument]
pub fn tag_exists(tag: &str) -> GitResult<bool> {
    let refspec = format!("refs/tags/{tag}");
    match git(&["rev-parse", "--quiet", "--verify", &refspec]) {
        Ok(_) => Ok(true),
        Err(GitError::Command { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Extract a version from `git version` output.
///
/// Handles the plain form (`git version 2.39.2`) as well as vendor-decorated
/// ones (`git version 2.37.1 (Apple Git-137.1)`, `git version 2.39.2.windows.1`).
fn parse_version_output(output: &str) -> Option<Version> {
    let token = output
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))?;

    let mut numbers = token.split('.').map_while(|part| part.parse::<u64>().ok());

    let major = numbers.next()?;
    let minor = numbers.next()?;
    let patch = numbers.next().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Run a git command and return its stdout.
fn git(args: &[&str]) -> GitResult<String> {
    let output = Command::new("git").args(args).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        // Detect "not a git repo" specifically
        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        Err(GitError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}
