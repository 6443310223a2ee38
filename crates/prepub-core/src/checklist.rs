//! The preflight checklist run before publishing a package.
//!
//! [`Checklist::build`] assembles the ordered list of checks for one release
//! attempt; nothing touches the outside world until the list is executed.
//! Checks run strictly in order because later checks read state earlier ones
//! produce: version validation computes the new version, and the pre-release
//! and tag-collision checks consume it. The first failing check aborts the
//! whole run.
//!
//! Execution and progress rendering are the caller's concern. The CLI steps
//! through [`Checklist::into_parts`] to drive its own display; programmatic
//! callers use [`Checklist::execute`].

use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::git::{self, GitError};
use crate::manifest::PackageManifest;
use crate::npm::{self, Collaborators, MIN_NPM_VERSION, NpmError};
use crate::version::{BumpRequest, VersionError, is_prerelease};

/// Environment variable that marks a test run (skips the auth check).
pub const ENV_TEST_RUN: &str = "PREPUB_TEST_RUN";

/// Fallback tag prefix when npm has none configured.
const DEFAULT_TAG_PREFIX: &str = "v";

/// Whether [`ENV_TEST_RUN`] marks this process as a test run.
pub fn test_run_from_env() -> bool {
    std::env::var_os(ENV_TEST_RUN).is_some_and(|value| !value.is_empty() && value != "0")
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Failure of an individual check.
#[derive(Error, Debug)]
pub enum CheckError {
    /// An npm invocation failed.
    #[error(transparent)]
    Npm(#[from] NpmError),

    /// A git invocation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The bump input was not recognized.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The default registry did not answer the connectivity probe.
    #[error("connection to the npm registry failed")]
    RegistryUnreachable {
        /// The probe failure.
        source: NpmError,
    },

    /// The installed npm is below the required minimum.
    #[error("please upgrade to npm@{minimum} or newer (found {found})", minimum = MIN_NPM_VERSION)]
    OutdatedNpm {
        /// The version npm reported.
        found: Version,
    },

    /// The authenticated user may not publish this package.
    #[error("you do not have write permissions required to publish this package")]
    MissingWritePermission,

    /// The requested version does not move the package forward.
    #[error("new version `{new}` should be higher than current version `{current}`")]
    NotHigher {
        /// The version the request resolved to.
        new: Version,
        /// The package's current version.
        current: Version,
    },

    /// Publishing a pre-release without an explicit dist-tag.
    #[error(
        "you must specify a dist-tag using --tag when publishing a pre-release version; \
         this prevents accidentally tagging an unstable version as \"latest\""
    )]
    MissingDistTag,

    /// The release tag already exists on the remote.
    #[error("git tag `{tag}` already exists on the remote")]
    TagExists {
        /// The fully-qualified tag name.
        tag: String,
    },

    /// A check read the computed version before version validation ran.
    #[error("new version has not been computed yet (version validation runs first)")]
    NewVersionUnset,
}

/// Result alias for checks.
pub type CheckResult<T> = Result<T, CheckError>;

/// A check failure, labeled with the check it came from.
#[derive(Error, Debug)]
#[error("{title}: {source}")]
pub struct ChecklistError {
    title: &'static str,
    source: CheckError,
}

impl ChecklistError {
    /// Label a check failure with its check title.
    pub const fn new(title: &'static str, source: CheckError) -> Self {
        Self { title, source }
    }

    /// Title of the check that failed.
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// The underlying failure.
    pub const fn check_error(&self) -> &CheckError {
        &self.source
    }
}

// ──────────────────────────────────────────────
// Inputs and run state
// ──────────────────────────────────────────────

/// Options for one release attempt.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Dist-tag to publish under (e.g. `next`); `None` means the default.
    pub tag: Option<String>,
    /// Overrides the configured tag prefix for the release tag.
    pub tag_prefix: Option<String>,
    /// Test runs skip the registry auth check. See [`test_run_from_env`].
    pub test_run: bool,
}

/// State threaded through the ordered checks.
///
/// `new_version` has exactly one writer (version validation) and is only
/// read by checks ordered after it.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The package being released.
    pub package: PackageManifest,
    /// The raw bump input; validated by the version check, not up front.
    pub input: String,
    /// Run options.
    pub options: Options,
    new_version: Option<Version>,
}

impl RunContext {
    fn new(input: String, package: PackageManifest, options: Options) -> Self {
        Self {
            package,
            input,
            options,
            new_version: None,
        }
    }

    /// The computed new version, once version validation has run.
    pub const fn new_version(&self) -> Option<&Version> {
        self.new_version.as_ref()
    }

    fn computed_version(&self) -> CheckResult<&Version> {
        self.new_version.as_ref().ok_or(CheckError::NewVersionUnset)
    }
}

// ──────────────────────────────────────────────
// Checks
// ──────────────────────────────────────────────

/// When a check is skipped instead of run.
#[derive(Clone, Copy)]
pub enum Skip {
    /// The check always runs.
    Never,
    /// The check is skipped when the predicate holds for the context.
    When(fn(&RunContext) -> bool),
}

impl Skip {
    fn applies(self, ctx: &RunContext) -> bool {
        match self {
            Self::Never => false,
            Self::When(predicate) => predicate(ctx),
        }
    }
}

/// How an unskipped or skipped check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    /// The check ran and succeeded.
    Passed,
    /// The check's skip predicate applied; it did not run.
    Skipped,
}

/// A single named precondition check.
pub struct Check {
    title: &'static str,
    skip: Skip,
    run: fn(&mut RunContext) -> CheckResult<()>,
}

impl Check {
    /// Human-readable name of the check.
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Whether this check would be skipped for the given context.
    pub fn is_skipped(&self, ctx: &RunContext) -> bool {
        self.skip.applies(ctx)
    }

    /// Run the check's action, ignoring the skip predicate.
    pub fn run(&self, ctx: &mut RunContext) -> CheckResult<()> {
        (self.run)(ctx)
    }

    /// Evaluate the check: skip, pass, or fail.
    pub fn evaluate(&self, ctx: &mut RunContext) -> CheckResult<CheckOutcome> {
        if self.is_skipped(ctx) {
            debug!(title = self.title, "check skipped");
            return Ok(CheckOutcome::Skipped);
        }
        (self.run)(ctx)?;
        debug!(title = self.title, "check passed");
        Ok(CheckOutcome::Passed)
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check").field("title", &self.title).finish()
    }
}

// ──────────────────────────────────────────────
// The checklist
// ──────────────────────────────────────────────

/// Record of one check in a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRecord {
    /// The check's title.
    pub title: &'static str,
    /// Whether it passed or was skipped.
    pub outcome: CheckOutcome,
}

/// Result of a fully successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistReport {
    /// Per-check outcomes, in execution order.
    pub checks: Vec<CheckRecord>,
    /// The version the release will publish.
    pub new_version: Version,
}

/// The ordered preflight checklist for one release attempt.
#[derive(Debug)]
pub struct Checklist {
    checks: Vec<Check>,
    context: RunContext,
}

impl Checklist {
    /// Assemble the checklist.
    ///
    /// Pure construction: no subprocess runs, no network traffic. The order
    /// of the returned checks is fixed and meaningful.
    #[instrument(skip_all, fields(package = %package.name))]
    pub fn build(input: impl Into<String>, package: PackageManifest, options: Options) -> Self {
        let checks = vec![
            Check {
                title: "Ping npm registry",
                skip: Skip::When(skips_registry_checks),
                run: ping_registry,
            },
            Check {
                title: "Check npm version",
                skip: Skip::Never,
                run: check_npm_version,
            },
            Check {
                title: "Verify user is authenticated",
                skip: Skip::When(skips_auth_check),
                run: verify_authenticated,
            },
            Check {
                title: "Verify git version is recent",
                skip: Skip::Never,
                run: check_git_version,
            },
            Check {
                title: "Check git remote",
                skip: Skip::Never,
                run: check_git_remote,
            },
            Check {
                title: "Validate version",
                skip: Skip::Never,
                run: validate_version,
            },
            Check {
                title: "Check for pre-release version",
                skip: Skip::Never,
                run: check_prerelease_tag,
            },
            Check {
                title: "Check git tag existence",
                skip: Skip::Never,
                run: check_tag_collision,
            },
        ];

        Self {
            checks,
            context: RunContext::new(input.into(), package, options),
        }
    }

    /// The checks in execution order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// The run state the checks operate on.
    pub const fn context(&self) -> &RunContext {
        &self.context
    }

    /// Split into checks and context so a caller can drive execution itself
    /// (e.g. to render per-check progress).
    pub fn into_parts(self) -> (Vec<Check>, RunContext) {
        (self.checks, self.context)
    }

    /// Run every check in order, stopping at the first failure.
    pub fn execute(self) -> Result<ChecklistReport, ChecklistError> {
        self.execute_with(|_, _| {})
    }

    /// Like [`execute`](Self::execute), invoking `observer` with each check's
    /// title and outcome as it completes.
    pub fn execute_with(
        self,
        mut observer: impl FnMut(&'static str, CheckOutcome),
    ) -> Result<ChecklistReport, ChecklistError> {
        let (checks, mut ctx) = self.into_parts();
        let mut records = Vec::with_capacity(checks.len());

        for check in &checks {
            let outcome = check
                .evaluate(&mut ctx)
                .map_err(|source| ChecklistError::new(check.title(), source))?;
            observer(check.title(), outcome);
            records.push(CheckRecord {
                title: check.title(),
                outcome,
            });
        }

        let new_version = ctx
            .computed_version()
            .map_err(|source| ChecklistError::new("Validate version", source))?
            .clone();

        Ok(ChecklistReport {
            checks: records,
            new_version,
        })
    }
}

// ──────────────────────────────────────────────
// Skip predicates
// ──────────────────────────────────────────────

/// Private packages and external registries have nothing to do with the
/// default registry, so connectivity and auth checks do not apply.
fn skips_registry_checks(ctx: &RunContext) -> bool {
    ctx.package.private || ctx.package.is_external_registry()
}

fn skips_auth_check(ctx: &RunContext) -> bool {
    ctx.options.test_run || skips_registry_checks(ctx)
}

// ──────────────────────────────────────────────
// Check actions
// ──────────────────────────────────────────────

fn ping_registry(_ctx: &mut RunContext) -> CheckResult<()> {
    npm::ping().map_err(|source| CheckError::RegistryUnreachable { source })
}

fn check_npm_version(_ctx: &mut RunContext) -> CheckResult<()> {
    let found = npm::cli_version()?;
    ensure_recent_npm(&found)
}

fn verify_authenticated(ctx: &mut RunContext) -> CheckResult<()> {
    let username = npm::username()?;

    // An unpublished package has no collaborator list; nothing to verify.
    let Some(collaborators) = npm::collaborators(&ctx.package.name)? else {
        return Ok(());
    };

    verify_write_permission(&collaborators, &username)
}

fn check_git_version(_ctx: &mut RunContext) -> CheckResult<()> {
    git::verify_recent_version()?;
    Ok(())
}

fn check_git_remote(_ctx: &mut RunContext) -> CheckResult<()> {
    git::verify_remote_is_valid()?;
    Ok(())
}

fn validate_version(ctx: &mut RunContext) -> CheckResult<()> {
    let request = BumpRequest::parse(&ctx.input)?;

    let current = &ctx.package.version;
    let new = request.resolve(current);
    if new <= *current {
        return Err(CheckError::NotHigher {
            new,
            current: current.clone(),
        });
    }

    debug!(%new, "new version computed");
    ctx.new_version = Some(new);
    Ok(())
}

fn check_prerelease_tag(ctx: &mut RunContext) -> CheckResult<()> {
    let new = ctx.computed_version()?;
    if !ctx.package.private && is_prerelease(new) && ctx.options.tag.is_none() {
        return Err(CheckError::MissingDistTag);
    }
    Ok(())
}

fn check_tag_collision(ctx: &mut RunContext) -> CheckResult<()> {
    git::fetch()?;

    let prefix = resolve_tag_prefix(&ctx.options);
    let tag = release_tag(&prefix, ctx.computed_version()?);
    if git::tag_exists(&tag)? {
        return Err(CheckError::TagExists { tag });
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn ensure_recent_npm(found: &Version) -> CheckResult<()> {
    if *found < MIN_NPM_VERSION {
        return Err(CheckError::OutdatedNpm {
            found: found.clone(),
        });
    }
    Ok(())
}

fn verify_write_permission(collaborators: &Collaborators, username: &str) -> CheckResult<()> {
    let has_write = collaborators
        .get(username)
        .is_some_and(|permissions| permissions.iter().any(|p| p == "write"));

    if has_write {
        Ok(())
    } else {
        Err(CheckError::MissingWritePermission)
    }
}

/// The tag prefix for this run: explicit override, then npm's configured
/// `tag-version-prefix`, then `v`.
fn resolve_tag_prefix(options: &Options) -> String {
    if let Some(ref prefix) = options.tag_prefix {
        return prefix.clone();
    }
    npm::tag_version_prefix().unwrap_or_else(|_| DEFAULT_TAG_PREFIX.to_string())
}

fn release_tag(prefix: &str, version: &Version) -> String {
    format!("{prefix}{version}")
}
