//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence from
//! an end-to-end perspective using the compiled binary. A run in an empty
//! directory always fails at the missing `package.json`, which conveniently
//! separates the two failure classes: a "package.json" error means the config
//! stage succeeded; a "configuration" error means it did not.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Assert that the run got past config loading (and stopped at the manifest).
fn assert_config_accepted(dir: &std::path::Path) {
    cmd()
        .args(["-C", dir.to_str().unwrap(), "minor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("package.json"));
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    assert_config_accepted(tmp.path());
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepub.toml"), r#"log_level = "debug""#).unwrap();
    assert_config_accepted(tmp.path());
}

#[test]
fn discovers_regular_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("prepub.toml"), r#"log_level = "warn""#).unwrap();
    assert_config_accepted(tmp.path());
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();

    // Config in root, run from nested/deep
    fs::write(tmp.path().join(".prepub.toml"), r#"log_level = "debug""#).unwrap();
    assert_config_accepted(&sub_dir);
}

#[test]
fn explicit_config_flag_is_honored() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("custom.toml");
    fs::write(
        &config_path,
        r#"
[publish]
tag = "next"
"#,
    )
    .unwrap();

    cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "minor",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("package.json"));
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_toml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".prepub.toml"),
        r#"
log_level = "warn"

[publish]
tag_prefix = "release-"
"#,
    )
    .unwrap();
    assert_config_accepted(tmp.path());
}

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".prepub.yaml"),
        "log_level: warn\npublish:\n  tag: next\n",
    )
    .unwrap();
    assert_config_accepted(tmp.path());
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".prepub.json"),
        r#"{"log_level": "error"}"#,
    )
    .unwrap();
    assert_config_accepted(tmp.path());
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepub.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "minor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepub.json"), "{not valid json}").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "minor"])
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    // Figment ignores unknown fields by default with serde
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".prepub.toml"),
        r#"
log_level = "info"
unknown_field = "should be ignored"
another_unknown = 42
"#,
    )
    .unwrap();
    assert_config_accepted(tmp.path());
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();

    // Structure: parent/.prepub.toml + parent/repo/.git/ + parent/repo/src/
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    // Config in parent (outside repo); .git marks the repo boundary
    fs::write(parent.join(".prepub.toml"), r#"log_level = "error""#).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    // Running from src/ should not find the parent config, and still work
    assert_config_accepted(&src);
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    // .git and config in same directory
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".prepub.toml"), r#"log_level = "debug""#).unwrap();

    assert_config_accepted(&src);
}
