//! Bump tokens and next-version computation.
//!
//! A release request is either a semver increment keyword (`major`, `minor`,
//! `patch`, `premajor`, `preminor`, `prepatch`, `prerelease`) or an explicit
//! version. Increment semantics match what `npm version` does, including the
//! pre-release-aware behavior of `major`/`minor`/`patch` and the `.0` seed
//! identifier for the `pre*` keywords.

use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

/// Errors from interpreting a release request.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The input is neither an increment keyword nor a valid semver version.
    #[error("version should be either {}, or a valid semver version (got `{input}`)", increment_list())]
    UnrecognizedInput {
        /// The rejected input token.
        input: String,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver increment keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemverIncrement {
    /// Next major release (X.0.0).
    Major,
    /// Next minor release (x.Y.0).
    Minor,
    /// Next patch release (x.y.Z).
    Patch,
    /// Pre-release of the next major version (X.0.0-0).
    Premajor,
    /// Pre-release of the next minor version (x.Y.0-0).
    Preminor,
    /// Pre-release of the next patch version (x.y.Z-0).
    Prepatch,
    /// Bump the pre-release identifier (or start one from the next patch).
    Prerelease,
}

impl SemverIncrement {
    /// All recognized keywords, in the order they are listed in errors.
    pub const ALL: &[Self] = &[
        Self::Major,
        Self::Minor,
        Self::Patch,
        Self::Premajor,
        Self::Preminor,
        Self::Prepatch,
        Self::Prerelease,
    ];

    /// The keyword as written on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Premajor => "premajor",
            Self::Preminor => "preminor",
            Self::Prepatch => "prepatch",
            Self::Prerelease => "prerelease",
        }
    }

    /// Look up an increment by keyword.
    pub fn from_keyword(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|inc| inc.as_str() == token)
    }
}

impl std::fmt::Display for SemverIncrement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The accepted keywords joined for error messages.
pub fn increment_list() -> String {
    let keywords: Vec<&str> = SemverIncrement::ALL.iter().map(|inc| inc.as_str()).collect();
    keywords.join(", ")
}

/// A parsed release request: an increment keyword or an explicit version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpRequest {
    /// One of the increment keywords.
    Increment(SemverIncrement),
    /// An explicit target version.
    Explicit(Version),
}

impl BumpRequest {
    /// Parse a raw input token.
    ///
    /// Accepts any increment keyword or a semver version with an optional
    /// leading `v`.
    pub fn parse(input: &str) -> VersionResult<Self> {
        let token = input.trim();
        if let Some(increment) = SemverIncrement::from_keyword(token) {
            return Ok(Self::Increment(increment));
        }

        let bare = token.strip_prefix('v').unwrap_or(token);
        Version::parse(bare)
            .map(Self::Explicit)
            .map_err(|_| VersionError::UnrecognizedInput {
                input: token.to_string(),
            })
    }

    /// Compute the version this request produces from `current`.
    pub fn resolve(&self, current: &Version) -> Version {
        match self {
            Self::Explicit(version) => version.clone(),
            Self::Increment(increment) => increment_version(current, *increment),
        }
    }
}

/// Whether a version carries a pre-release identifier.
pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

/// Apply an increment keyword to a version, npm style.
///
/// `major`/`minor`/`patch` on a matching pre-release merely finalize it
/// (`1.0.0-rc.1` + `major` is `1.0.0`, not `2.0.0`). Build metadata is
/// always dropped.
pub fn increment_version(current: &Version, increment: SemverIncrement) -> Version {
    let mut next = current.clone();
    next.build = BuildMetadata::EMPTY;

    match increment {
        SemverIncrement::Major => {
            if current.pre.is_empty() || current.minor != 0 || current.patch != 0 {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        SemverIncrement::Minor => {
            if current.pre.is_empty() || current.patch != 0 {
                next.minor += 1;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        SemverIncrement::Patch => {
            if current.pre.is_empty() {
                next.patch += 1;
            }
            next.pre = Prerelease::EMPTY;
        }
        SemverIncrement::Premajor => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            next.pre = initial_prerelease();
        }
        SemverIncrement::Preminor => {
            next.minor += 1;
            next.patch = 0;
            next.pre = initial_prerelease();
        }
        SemverIncrement::Prepatch => {
            next.patch += 1;
            next.pre = initial_prerelease();
        }
        SemverIncrement::Prerelease => {
            if current.pre.is_empty() {
                next.patch += 1;
                next.pre = initial_prerelease();
            } else {
                next.pre = bump_prerelease(current.pre.as_str());
            }
        }
    }

    next
}

/// The `.0` identifier that seeds a fresh pre-release.
fn initial_prerelease() -> Prerelease {
    Prerelease::new("0").unwrap_or(Prerelease::EMPTY)
}

/// Increment the last numeric identifier, or append `.0` if there is none.
fn bump_prerelease(pre: &str) -> Prerelease {
    let mut identifiers: Vec<String> = pre.split('.').map(str::to_string).collect();

    let mut bumped = false;
    for identifier in identifiers.iter_mut().rev() {
        if let Ok(numeric) = identifier.parse::<u64>() {
            *identifier = (numeric + 1).to_string();
            bumped = true;
            break;
        }
    }
    if !bumped {
        identifiers.push("0".to_string());
    }

    Prerelease::new(&identifiers.join(".")).unwrap_or(Prerelease::EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn bump(current: &str, increment: SemverIncrement) -> Version {
        increment_version(&v(current), increment)
    }

    #[test]
    fn parse_keywords() {
        for increment in SemverIncrement::ALL {
            assert_eq!(
                BumpRequest::parse(increment.as_str()).unwrap(),
                BumpRequest::Increment(*increment)
            );
        }
    }

    #[test]
    fn parse_explicit() {
        assert_eq!(
            BumpRequest::parse("1.2.3").unwrap(),
            BumpRequest::Explicit(v("1.2.3"))
        );
    }

    #[test]
    fn parse_explicit_with_v_prefix() {
        assert_eq!(
            BumpRequest::parse("v2.0.0").unwrap(),
            BumpRequest::Explicit(v("2.0.0"))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = BumpRequest::parse("banana").unwrap_err();
        let message = err.to_string();
        for increment in SemverIncrement::ALL {
            assert!(message.contains(increment.as_str()), "missing {increment} in: {message}");
        }
        assert!(message.contains("banana"));
    }

    #[test]
    fn parse_rejects_partial_version() {
        assert!(BumpRequest::parse("1.2").is_err());
    }

    #[test]
    fn resolve_minor() {
        let request = BumpRequest::parse("minor").unwrap();
        assert_eq!(request.resolve(&v("1.2.0")), v("1.3.0"));
    }

    #[test]
    fn major_minor_patch() {
        assert_eq!(bump("1.2.3", SemverIncrement::Major), v("2.0.0"));
        assert_eq!(bump("1.2.3", SemverIncrement::Minor), v("1.3.0"));
        assert_eq!(bump("1.2.3", SemverIncrement::Patch), v("1.2.4"));
    }

    #[test]
    fn major_finalizes_premajor() {
        // 2.0.0-rc.1 is already "the next major"; finalize instead of skipping to 3.0.0
        assert_eq!(bump("2.0.0-rc.1", SemverIncrement::Major), v("2.0.0"));
        assert_eq!(bump("2.1.0-rc.1", SemverIncrement::Major), v("3.0.0"));
    }

    #[test]
    fn minor_finalizes_preminor() {
        assert_eq!(bump("1.3.0-0", SemverIncrement::Minor), v("1.3.0"));
        assert_eq!(bump("1.3.1-0", SemverIncrement::Minor), v("1.4.0"));
    }

    #[test]
    fn patch_finalizes_prepatch() {
        assert_eq!(bump("1.2.4-0", SemverIncrement::Patch), v("1.2.4"));
        assert_eq!(bump("1.2.4", SemverIncrement::Patch), v("1.2.5"));
    }

    #[test]
    fn pre_increments_seed_zero() {
        assert_eq!(bump("1.2.3", SemverIncrement::Premajor), v("2.0.0-0"));
        assert_eq!(bump("1.2.3", SemverIncrement::Preminor), v("1.3.0-0"));
        assert_eq!(bump("1.2.3", SemverIncrement::Prepatch), v("1.2.4-0"));
    }

    #[test]
    fn prerelease_from_stable_behaves_like_prepatch() {
        assert_eq!(bump("2.0.0", SemverIncrement::Prerelease), v("2.0.1-0"));
    }

    #[test]
    fn prerelease_bumps_numeric_identifier() {
        assert_eq!(bump("1.0.0-0", SemverIncrement::Prerelease), v("1.0.0-1"));
        assert_eq!(bump("1.0.0-alpha.1", SemverIncrement::Prerelease), v("1.0.0-alpha.2"));
    }

    #[test]
    fn prerelease_appends_zero_when_no_numeric_identifier() {
        assert_eq!(bump("1.0.0-alpha", SemverIncrement::Prerelease), v("1.0.0-alpha.0"));
    }

    #[test]
    fn prerelease_bumps_last_numeric_identifier() {
        assert_eq!(
            bump("1.0.0-alpha.1.beta", SemverIncrement::Prerelease),
            v("1.0.0-alpha.2.beta")
        );
    }

    #[test]
    fn increments_drop_build_metadata() {
        assert_eq!(bump("1.2.3+build.5", SemverIncrement::Patch), v("1.2.4"));
        assert_eq!(bump("1.2.3+build.5", SemverIncrement::Prepatch), v("1.2.4-0"));
    }

    #[test]
    fn is_prerelease_detects_identifier() {
        assert!(is_prerelease(&v("1.0.0-beta.2")));
        assert!(!is_prerelease(&v("1.0.0")));
    }

    #[test]
    fn incremented_versions_compare_higher() {
        let current = v("1.2.0");
        for increment in SemverIncrement::ALL {
            let next = increment_version(&current, *increment);
            assert!(next > current, "{increment} produced {next} from {current}");
        }
    }
}
