//! Checklist execution with terminal progress rendering.
//!
//! The core hands us the ordered checks; this module drives them one at a
//! time so each check gets a spinner while its subprocess or network call is
//! in flight. `--json` skips the rendering entirely and prints the report.

use std::time::Duration;

use anyhow::Context;
use camino::Utf8Path;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use prepub_core::checklist::{self, Checklist, ChecklistError, Options};
use prepub_core::config::Config;
use prepub_core::manifest::PackageManifest;

use crate::Cli;

/// Build the checklist for this invocation and run it to completion.
#[instrument(skip_all, fields(input = %cli.version, json = cli.json))]
pub fn run(cli: &Cli, config: &Config, cwd: &Utf8Path) -> anyhow::Result<()> {
    let package = PackageManifest::load(cwd)?;

    let publish = config.publish.clone().unwrap_or_default();
    let options = Options {
        tag: cli.tag.clone().or(publish.tag),
        tag_prefix: cli.tag_prefix.clone().or(publish.tag_prefix),
        test_run: checklist::test_run_from_env(),
    };
    debug!(?options, "resolved run options");

    let checklist = Checklist::build(cli.version.clone(), package, options);

    if cli.json {
        let report = checklist.execute()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let name = checklist.context().package.name.clone();
    let current = checklist.context().package.version.clone();
    println!(
        "{}",
        format!("Publish a new version of {name} (current: {current})").bold()
    );
    println!();

    let (checks, mut ctx) = checklist.into_parts();
    for check in &checks {
        if check.is_skipped(&ctx) {
            println!(
                "  {} {} {}",
                "-".dimmed(),
                check.title(),
                "[skipped]".dimmed()
            );
            continue;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message(check.title());
        spinner.enable_steady_tick(Duration::from_millis(80));

        match check.run(&mut ctx) {
            Ok(()) => {
                spinner.finish_and_clear();
                println!("  {} {}", "✓".green(), check.title());
            }
            Err(source) => {
                spinner.finish_and_clear();
                println!("  {} {}", "✗".red(), check.title().bold());
                return Err(ChecklistError::new(check.title(), source).into());
            }
        }
    }

    let new_version = ctx
        .new_version()
        .context("checklist finished without a computed version")?;

    println!();
    println!(
        "  {} {}",
        "All preflight checks passed.".green().bold(),
        format!("Ready to publish {name}@{new_version}").bold()
    );
    Ok(())
}
