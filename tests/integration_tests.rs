//! Integration tests for the framevote CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn framevote(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("framevote").unwrap();
    // Keep user/repo config and environment out of the test run.
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .env("FRAMEVOTE_POOL__OVERSUBSCRIBE", "clamp");
    cmd
}

fn camera_dir(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(temp_dir.path().join(name), content).unwrap();
    }
    temp_dir
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    framevote(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    framevote(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("framevote"));
}

/// Two cameras agreeing on frame 0 and disagreeing on frame 5
#[test]
fn test_analyze_prints_summary_in_reference_order() {
    let dir = camera_dir(&[
        ("cam1.txt", "0, true\n5, true\n"),
        ("cam2.txt", "0, true\n5, false\n"),
        ("notes.txt", "0, false\n"),
    ]);

    let assert = framevote(dir.path())
        .args(["analyze", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Frames with majority of the present votes true: 2",
        ))
        .stdout(predicate::str::contains(
            "Frames with any of the present votes true: 2",
        ))
        .stdout(predicate::str::contains(
            "Frames with all of the present votes true: 1",
        ));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let majority = stdout.find("majority").unwrap();
    let any = stdout.find("any of").unwrap();
    let all = stdout.find("all of").unwrap();
    assert!(majority < any && any < all);
}

#[test]
fn test_analyze_json_output() {
    let dir = camera_dir(&[("cam1.txt", "3, true\n"), ("cam2.txt", "3, false\n")]);

    let assert = framevote(dir.path())
        .args(["--format", "json", "analyze", ".", "--workers", "1"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["summary"]["majority_true"], 1);
    assert_eq!(report["summary"]["any_true"], 1);
    assert_eq!(report["summary"]["all_true"], 0);
    assert_eq!(report["files_ingested"], 2);
    assert_eq!(report["workers"], 1);
}

/// Malformed input aborts the run by default
#[test]
fn test_invalid_file_aborts_by_default() {
    let dir = camera_dir(&[("cam1.txt", "0, true\n"), ("cam2.txt", "1, yes\n")]);

    framevote(dir.path())
        .args(["analyze", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cam2.txt"))
        .stdout(predicate::str::contains("Frames with").not());
}

#[test]
fn test_invalid_file_can_be_skipped() {
    let dir = camera_dir(&[("cam1.txt", "0, true\n"), ("cam2.txt", "1, yes\n")]);

    framevote(dir.path())
        .args(["analyze", ".", "--on-invalid-file", "skip"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipped"))
        .stdout(predicate::str::contains(
            "Frames with all of the present votes true: 1",
        ));
}

#[test]
fn test_frame_beyond_max_frames_is_rejected() {
    let dir = camera_dir(&[("cam1.txt", "10, true\n")]);

    framevote(dir.path())
        .args(["analyze", ".", "--max-frames", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the valid range"));
}

#[test]
fn test_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    framevote(temp_dir.path())
        .args(["analyze", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_repo_config_file_is_used() {
    let dir = camera_dir(&[("front.log", "2, true\n"), ("cam1.txt", "2, false\n")]);
    fs::write(
        dir.path().join("framevote.toml"),
        "[input]\npattern = \"*.log\"\n",
    )
    .unwrap();

    framevote(dir.path())
        .args(["analyze", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Frames with all of the present votes true: 1",
        ));
}

#[test]
fn test_config_show_and_validate() {
    let temp_dir = TempDir::new().unwrap();

    framevote(temp_dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_frames = 600000"))
        .stdout(predicate::str::contains("oversubscribe = \"clamp\""));

    framevote(temp_dir.path())
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_value_fails() {
    let temp_dir = TempDir::new().unwrap();

    framevote(temp_dir.path())
        .env("FRAMEVOTE_FRAMES__MAX_FRAMES", "0")
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_frames"));
}

#[test]
fn test_huge_max_frames_is_refused() {
    let dir = camera_dir(&[("cam1.txt", "0, true\n")]);

    framevote(dir.path())
        .args(["analyze", ".", "--max-frames", "100000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be at most"));
}
