// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the `vcal` binary.
//!
//! Runs the compiled executable against temporary repositories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Runs `vcal` in `cwd` without local config files or keyring access.
fn vcal(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vcal"))
        .args(["--no-local-config", "-s", "credentials.storage=memory"])
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run vcal")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_git(args: &[&str], cwd: &Path) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run git")
        .status;
    assert!(status.success(), "git {args:?} failed");
}

fn init_repo(dir: &Path) {
    run_git(&["init", "--quiet"], dir);
    run_git(&["config", "user.email", "test@example.com"], dir);
    run_git(&["config", "user.name", "Test"], dir);
}

// =============================================================================
// Informational commands
// =============================================================================

#[test]
fn cli_version_command() {
    let temp = temp_dir();
    let output = vcal(temp.path(), &["version"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn cli_options_reflect_overrides() {
    let temp = temp_dir();
    let output = vcal(temp.path(), &["-s", "dispatcher.workers=3", "options"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let line = text
        .lines()
        .find(|line| line.starts_with("dispatcher.workers"))
        .unwrap();
    assert!(line.ends_with("= 3"), "unexpected line: {line}");
    assert!(text.contains("credentials.storage"));
}

#[test]
fn cli_invalid_config_fails() {
    let temp = temp_dir();
    let output = vcal(temp.path(), &["-s", "dispatcher.workers=0", "options"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("workers"));
}

#[test]
fn cli_plain_directory_has_no_backend() {
    let temp = temp_dir();
    let output = vcal(temp.path(), &["features"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no backend for directory"));
}

// =============================================================================
// Repository workflow
// =============================================================================

#[test]
fn cli_status_stage_commit_log() {
    let temp = temp_dir();
    init_repo(temp.path());
    fs::write(temp.path().join("a.txt"), "a").unwrap();

    let output = vcal(temp.path(), &["status", "--json"]);
    assert!(output.status.success());
    let status: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(status["changes"][0]["path"], "a.txt");
    assert_eq!(status["changes"][0]["kind"], "added");
    assert_eq!(status["changes"][0]["staged"], false);

    assert!(vcal(temp.path(), &["stage", "a.txt"]).status.success());
    assert!(vcal(temp.path(), &["commit", "-m", "First"]).status.success());

    let output = vcal(temp.path(), &["log", "-n", "1", "--json"]);
    assert!(output.status.success());
    let log: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(log[0]["title"], "First");

    let output = vcal(temp.path(), &["status"]);
    assert!(stdout(&output).contains("No changes"));
}

#[test]
fn cli_directory_option_and_branches() {
    let temp = temp_dir();
    let repo = temp.path().join("repo");
    fs::create_dir_all(&repo).unwrap();
    init_repo(&repo);
    fs::write(repo.join("a.txt"), "a").unwrap();
    run_git(&["add", "a.txt"], &repo);
    run_git(&["commit", "--quiet", "-m", "A"], &repo);

    let dir = repo.display().to_string();
    let output = vcal(temp.path(), &["-C", &dir, "create-branch", "topic"]);
    assert!(output.status.success());

    let output = vcal(temp.path(), &["-C", &dir, "branch"]);
    assert_eq!(stdout(&output).trim(), "topic");

    let output = vcal(temp.path(), &["-C", &dir, "branches", "--editable"]);
    assert!(stdout(&output).lines().any(|line| line == "topic"));
}

#[test]
fn cli_init_creates_repository() {
    let temp = temp_dir();
    let target = temp.path().join("fresh");
    let output = vcal(temp.path(), &["init", &target.display().to_string()]);
    assert!(output.status.success());
    assert!(target.join(".git").is_dir());
}
