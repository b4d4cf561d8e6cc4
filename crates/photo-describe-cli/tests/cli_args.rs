//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use photo_describe_test_support::FixtureFolder;
use predicates::prelude::*;

/// Command isolated from the user's config, running in `cwd`.
fn photo_describe(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-describe").unwrap();
    cmd.current_dir(cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".xdg"))
        .env("HOME", cwd);
    cmd
}

#[test]
fn test_missing_folder_shows_error() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No folder specified"));
}

#[test]
fn test_nonexistent_folder_is_an_error() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .arg(work.path().join("no-such-folder"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to process"));

    assert!(!work.path().join("descriptions.txt").exists());
    assert!(!work.path().join("processed_images.json").exists());
}

#[test]
fn test_empty_folder_has_nothing_to_do() {
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new().with_file("notes.txt", b"not an image");

    photo_describe(work.path())
        .arg(folder.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("nothing to do"));

    assert!(!work.path().join("descriptions.txt").exists());
}

#[test]
fn test_run_subcommand_matches_bare_form() {
    let work = tempfile::tempdir().unwrap();
    let folder = FixtureFolder::new();

    photo_describe(work.path())
        .arg("run")
        .arg(folder.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("All 0 images"));
}

#[test]
fn test_zero_workers_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--workers", "0"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be at least 1"));
}

#[test]
fn test_zero_checkpoint_interval_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--checkpoint-interval", "0"])
        .arg(work.path())
        .assert()
        .failure();
}

#[test]
fn test_negative_retry_delay_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--retry-delay=-1"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_huge_retry_delay_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--retry-delay", "1e300"])
        .arg(work.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value '1e300'"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_huge_timeout_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--timeout", "1e20"])
        .arg(work.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("non-negative number of seconds"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_zero_timeout_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--timeout", "0"])
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn test_non_numeric_retries_rejected() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .args(["--max-retries", "many"])
        .arg(work.path())
        .assert()
        .failure();
}

#[test]
fn test_help_lists_subcommands() {
    let work = tempfile::tempdir().unwrap();
    photo_describe(work.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("reset"))
                .and(predicate::str::contains("paths")),
        );
}
