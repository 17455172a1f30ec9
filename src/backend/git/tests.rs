// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use super::create::Rollback;
use super::{
    AuthMode, BranchStatus, GitBackend, GitDriver, GitSettings, StatusEntry, code_kind,
    escape_path, parse_branch_header, parse_history, parse_status,
};
use crate::backend::{Backend, Driver};
use crate::change::{ChangeKind, ChangeRecord};
use crate::credentials::{CredentialKey, Credentials, MemorySecrets};
use crate::error::VcsError;
use crate::feature::{Capability, CapabilityGroup, Method, Operation, Property, PropertyOp};

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn settings() -> GitSettings {
    GitSettings::builder()
        .auth_mode(AuthMode::NonInteractive)
        .secrets(Arc::new(MemorySecrets::new()))
        .build()
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "--quiet"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test"]);
}

// --- porcelain parsing ---

#[test]
fn test_code_kind_table() {
    assert_eq!(code_kind(' '), ChangeKind::Unchanged);
    assert_eq!(code_kind('A'), ChangeKind::Added);
    assert_eq!(code_kind('D'), ChangeKind::Removed);
    assert_eq!(code_kind('M'), ChangeKind::Modified);
    assert_eq!(code_kind('R'), ChangeKind::Removed);
    assert_eq!(code_kind('C'), ChangeKind::Copied);
    assert_eq!(code_kind('U'), ChangeKind::Unknown);
}

#[test]
fn test_parse_status_entries() {
    let output = "## main...origin/main [ahead 1, behind 2]\0 M src/lib.rs\0A  new file.txt\0?? notes.txt\0";
    let report = parse_status(output, true).unwrap();

    assert_eq!(
        report.branch,
        Some(BranchStatus {
            local: "main".to_string(),
            remote: Some("origin/main".to_string()),
            ahead: 1,
            behind: 2,
        })
    );
    assert_eq!(
        report.records(),
        vec![
            ChangeRecord::new("src/lib.rs", ChangeKind::Modified, false),
            ChangeRecord::new("new file.txt", ChangeKind::Added, true),
            ChangeRecord::new("notes.txt", ChangeKind::Added, false),
        ]
    );
}

#[test]
fn test_parse_status_both_sides_unstaged_first() {
    let report = parse_status("MM a.txt\0", false).unwrap();
    assert_eq!(
        report.records(),
        vec![
            ChangeRecord::new("a.txt", ChangeKind::Modified, false),
            ChangeRecord::new("a.txt", ChangeKind::Modified, true),
        ]
    );
}

#[test]
fn test_parse_status_rename_reports_both_paths() {
    let report = parse_status("R  new.rs\0old.rs\0 M other.rs\0", false).unwrap();
    let records = report.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], ChangeRecord::new("old.rs", ChangeKind::Removed, true));
    assert_eq!(records[1].path, "new.rs");
    assert_eq!(records[1].kind, ChangeKind::Added);
    assert!(records[1].staged);
    assert_eq!(records[1].comment.as_deref(), Some("from old.rs"));
    assert_eq!(records[2], ChangeRecord::new("other.rs", ChangeKind::Modified, false));
}

#[test]
fn test_parse_status_rename_keeps_worktree_side() {
    let report = parse_status("RM new.rs\0old.rs\0", false).unwrap();
    assert_eq!(
        report.entries[1],
        StatusEntry {
            path: "new.rs".to_string(),
            staged: ChangeKind::Added,
            unstaged: ChangeKind::Modified,
            source: Some("old.rs".to_string()),
        }
    );
    assert_eq!(report.entries[0].path, "old.rs");
    assert_eq!(report.entries[0].unstaged, ChangeKind::Unchanged);
}

#[test]
fn test_collapse_prefers_exact_path() {
    let mut report = parse_status("R  new.rs\0old.rs\0", false).unwrap();
    report.collapse("new.rs");
    assert_eq!(
        report.records(),
        vec![ChangeRecord {
            comment: Some("from old.rs".to_string()),
            ..ChangeRecord::new("new.rs", ChangeKind::Added, true)
        }]
    );
}

#[test]
fn test_parse_status_paths_with_quotes_and_dashes() {
    let report = parse_status(" M -leading\0?? say \"hi\".txt\0", false).unwrap();
    let paths: Vec<_> = report.records().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["-leading", "say \"hi\".txt"]);
}

#[test]
fn test_parse_status_without_header_keeps_first_record() {
    let report = parse_status(" D gone.txt\0", true).unwrap();
    assert_eq!(report.branch, None);
    assert_eq!(
        report.records(),
        vec![ChangeRecord::new("gone.txt", ChangeKind::Removed, false)]
    );
}

#[test]
fn test_branch_header_variants() {
    let plain = parse_branch_header("## main").unwrap().unwrap();
    assert_eq!(plain.local, "main");
    assert_eq!(plain.remote, None);
    assert_eq!((plain.ahead, plain.behind), (0, 0));

    let behind = parse_branch_header("## dev...origin/dev [behind 7]")
        .unwrap()
        .unwrap();
    assert_eq!((behind.ahead, behind.behind), (0, 7));

    let gone = parse_branch_header("## dev...origin/dev [gone]")
        .unwrap()
        .unwrap();
    assert_eq!(gone.remote.as_deref(), Some("origin/dev"));

    let fresh = parse_branch_header("## No commits yet on trunk")
        .unwrap()
        .unwrap();
    assert_eq!(fresh.local, "trunk");

    let detached = parse_branch_header("## HEAD (no branch)").unwrap().unwrap();
    assert_eq!(detached.local, "HEAD");

    assert_eq!(parse_branch_header(" M file").unwrap(), None);
}

#[test]
fn test_collapse_directory_pathspec() {
    let mut report = parse_status(" M dir/a\0 M dir/b\0A  dir/c\0", false).unwrap();
    report.collapse("dir");
    assert_eq!(
        report.records(),
        vec![
            ChangeRecord::new("dir", ChangeKind::Modified, false),
            ChangeRecord::new("dir", ChangeKind::Modified, true),
        ]
    );

    let mut same = parse_status(" M dir/a\0 M dir/b\0", false).unwrap();
    same.collapse("dir");
    assert_eq!(
        same.records(),
        vec![ChangeRecord::new("dir", ChangeKind::Modified, false)]
    );

    let mut root = parse_status(" M a\0 M b\0", false).unwrap();
    root.collapse(".");
    assert_eq!(root.entries.len(), 2);
}

#[test]
fn test_escape_path() {
    assert_eq!(escape_path("-rf"), "\\-rf");
    assert_eq!(escape_path("src/-x"), "src/-x");
    assert_eq!(escape_path("."), ".");
}

// --- history parsing ---

#[test]
fn test_parse_history_records() {
    let output = "id:abc1234\nauthor_username:Ann\nauthor_email:ann@example.com\ncommit_date:1700000000\ntitle:Fix: colon in title\ndescription:\nbody line\n\0\nid:def5678\nauthor_username:Bob\nauthor_email:bob@example.com\ncommit_date:1600000000\ntitle:Initial\ndescription:\n\0\n";
    let commits = parse_history(output);
    assert_eq!(commits.len(), 2);

    let first = &commits[0];
    assert_eq!(first.id.as_deref(), Some("abc1234"));
    assert_eq!(first.title.as_deref(), Some("Fix: colon in title"));
    assert_eq!(first.author_username.as_deref(), Some("Ann"));
    assert_eq!(first.description.as_deref(), Some("body line\n"));
    assert_eq!(
        first.content.as_deref(),
        Some("Fix: colon in title\nbody line\n")
    );
    assert_eq!(
        first.commit_date,
        Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    );

    assert_eq!(commits[1].description.as_deref(), Some(""));
    assert_eq!(commits[1].content.as_deref(), Some("Initial\n"));
}

#[test]
fn test_parse_history_empty() {
    assert!(parse_history("").is_empty());
    assert!(parse_history("\n\0\n").is_empty());
}

// --- capabilities ---

#[test]
fn test_driver_capabilities_depend_on_auth_mode() {
    let driver = GitDriver::new(settings());
    assert!(!driver.capabilities().contains(Capability::CREDENTIALS_GET));
    assert!(driver.check_all(CapabilityGroup::Remote));
    assert!(driver.check_all(CapabilityGroup::Branches));

    let interactive = GitDriver::new(
        GitSettings::builder()
            .auth_mode(AuthMode::Interactive)
            .secrets(Arc::new(MemorySecrets::new()))
            .build(),
    );
    assert!(interactive.capabilities().contains(Capability::CREDENTIALS_SET));
}

#[test]
fn test_driver_disables_unimplemented_accessors() {
    let driver = GitDriver::new(settings());
    for op in [
        Operation::Property(Property::Branch, PropertyOp::Del),
        Operation::Property(Property::Branches, PropertyOp::Set),
        Operation::Property(Property::Changes, PropertyOp::Set),
        Operation::Property(Property::Tags, PropertyOp::Del),
    ] {
        assert!(!driver.feature(op).enabled, "{op} should be disabled");
    }
}

#[test]
fn test_feature_extra_tables() {
    let driver = GitDriver::new(settings());
    assert!(
        driver
            .feature(Operation::Method(Method::CreateBranch))
            .extra_flag("empty")
    );
    assert!(
        driver
            .feature(Operation::Property(Property::Tags, PropertyOp::Get))
            .extra_flag("branch")
    );
    let attrs = driver
        .feature(Operation::Method(Method::GetLastCommits))
        .extra["attrs"]
        .clone();
    assert_eq!(attrs.as_array().map(Vec::len), Some(7));
}

#[test]
fn test_auth_mode_serde() {
    let mode: AuthMode = serde_json::from_str("\"non_interactive\"").unwrap();
    assert_eq!(mode, AuthMode::NonInteractive);
    assert!(!mode.is_interactive());
    assert!(AuthMode::Interactive.is_interactive());
    assert_eq!(AuthMode::Auto.is_interactive(), !cfg!(windows));
}

// --- rollback ---

#[test]
fn test_rollback_removes_created_ancestors_only() {
    let temp = temp_dir();
    let target = temp.path().join("a").join("b").join("repo");

    let rollback = Rollback::prepare(&target).expect("prepare");
    assert_eq!(rollback, Rollback::RemoveTree(temp.path().join("a")));
    assert!(target.is_dir());

    rollback.run();
    assert!(!temp.path().join("a").exists());
    assert!(temp.path().exists());
}

#[test]
fn test_rollback_clears_existing_empty_directory() {
    let temp = temp_dir();
    let rollback = Rollback::prepare(temp.path()).expect("prepare");
    assert_eq!(rollback, Rollback::ClearContents(temp.path().to_path_buf()));

    std::fs::create_dir(temp.path().join(".git")).unwrap();
    std::fs::write(temp.path().join("file"), "x").unwrap();
    rollback.run();
    assert!(temp.path().exists());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_prepare_rejects_non_empty_directory() {
    let temp = temp_dir();
    std::fs::write(temp.path().join("keep"), "x").unwrap();
    let err = Rollback::prepare(temp.path()).unwrap_err();
    assert!(matches!(err, VcsError::Io(ref io) if io.kind() == std::io::ErrorKind::AlreadyExists));
    assert!(temp.path().join("keep").exists());
}

// --- real repositories ---

#[test]
fn test_open_rejects_plain_directory() {
    let temp = temp_dir();
    let err = GitBackend::open(&settings(), temp.path()).unwrap_err();
    match err {
        VcsError::BackendUnavailable(unavailable) => {
            assert!(!unavailable.is_valid_repository);
            assert!(!unavailable.missing_dependencies());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_open_with_missing_program() {
    let temp = temp_dir();
    let settings = GitSettings::builder()
        .program(temp.path().join("no-such-git"))
        .secrets(Arc::new(MemorySecrets::new()))
        .build();
    let err = GitBackend::open(&settings, temp.path()).unwrap_err();
    match err {
        VcsError::BackendUnavailable(unavailable) => {
            assert_eq!(unavailable.programs, vec!["git".to_string()]);
            assert!(unavailable.missing_dependencies());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_open_from_subdirectory_resolves_root() {
    let temp = temp_dir();
    init_repo(temp.path());
    let nested = temp.path().join("src").join("deep");
    std::fs::create_dir_all(&nested).unwrap();

    let backend = GitBackend::open(&settings(), &nested).unwrap();
    let expected = git(temp.path(), &["rev-parse", "--show-toplevel"]);
    assert_eq!(backend.repodir(), Path::new(&expected));
}

#[test]
fn test_changes_and_change_on_real_repo() {
    let temp = temp_dir();
    init_repo(temp.path());
    std::fs::write(temp.path().join("a.txt"), "one").unwrap();

    let backend = GitBackend::open(&settings(), temp.path()).unwrap();
    assert_eq!(
        backend.changes().unwrap(),
        vec![ChangeRecord::new("a.txt", ChangeKind::Added, false)]
    );
    assert!(backend.stage("a.txt").unwrap());
    assert!(backend.stage("a.txt").unwrap(), "stage is idempotent");
    assert_eq!(
        backend.change("a.txt", false).unwrap(),
        Some(ChangeRecord::new("a.txt", ChangeKind::Added, true))
    );

    std::fs::write(temp.path().join("a.txt"), "two").unwrap();
    assert_eq!(
        backend.change("a.txt", true).unwrap(),
        Some(ChangeRecord::new("a.txt", ChangeKind::Modified, false))
    );
    assert_eq!(
        backend.change("a.txt", false).unwrap(),
        Some(ChangeRecord::new("a.txt", ChangeKind::Added, true))
    );
    assert_eq!(backend.change("missing.txt", false).unwrap(), None);
}

#[test]
fn test_operations_fail_after_git_dir_removed() {
    let temp = temp_dir();
    init_repo(temp.path());
    let backend = GitBackend::open(&settings(), temp.path()).unwrap();
    std::fs::remove_dir_all(temp.path().join(".git")).unwrap();
    assert!(matches!(backend.changes(), Err(VcsError::Io(_))));
}

#[test]
fn test_credentials_disabled_without_interactive_auth() {
    let temp = temp_dir();
    init_repo(temp.path());
    let backend = GitBackend::open(&settings(), temp.path()).unwrap();
    let err = backend
        .set_credentials(Credentials::default().with(CredentialKey::Token, Some("t")))
        .unwrap_err();
    match err {
        VcsError::Feature(feature) => assert!(!feature.feature.enabled),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        backend.required_credentials(),
        &[CredentialKey::Username, CredentialKey::Password]
    );
}

#[test]
fn test_credentials_round_trip_through_origin_context() {
    let temp = temp_dir();
    init_repo(temp.path());
    git(
        temp.path(),
        &["remote", "add", "origin", "https://example.com/repo.git"],
    );
    let secrets = Arc::new(MemorySecrets::new());
    let settings = GitSettings::builder()
        .auth_mode(AuthMode::Interactive)
        .secrets(secrets.clone())
        .build();
    let backend = GitBackend::open(&settings, temp.path()).unwrap();

    backend
        .set_credentials(
            Credentials::default()
                .with(CredentialKey::Username, Some("ann"))
                .with(CredentialKey::Password, Some("pw")),
        )
        .unwrap();
    assert_eq!(secrets.len(), 1);
    assert_eq!(
        backend.credentials().unwrap().get(CredentialKey::Password),
        Some("pw")
    );

    backend.clear_credentials().unwrap();
    assert_eq!(backend.credentials().unwrap().get(CredentialKey::Password), None);

    // resolve the stored pair again
    backend
        .set_credentials(Credentials::default().with(CredentialKey::Username, Some("ann")))
        .unwrap();
    assert_eq!(
        backend.credentials().unwrap().get(CredentialKey::Password),
        Some("pw")
    );
}

#[test]
fn test_credentials_without_origin_fail() {
    let temp = temp_dir();
    init_repo(temp.path());
    let settings = GitSettings::builder()
        .auth_mode(AuthMode::Interactive)
        .secrets(Arc::new(MemorySecrets::new()))
        .build();
    let backend = GitBackend::open(&settings, temp.path()).unwrap();
    let err = backend
        .set_credentials(Credentials::default().with(CredentialKey::Token, Some("t")))
        .unwrap_err();
    assert!(matches!(err, VcsError::Credential(_)));
}

#[test]
fn test_create_rejects_bad_url_without_touching_disk() {
    let temp = temp_dir();
    let target = temp.path().join("new");
    let err = GitDriver::new(settings())
        .create(&target, Some("not a url"), None)
        .unwrap_err();
    assert!(matches!(err, VcsError::InvalidArgument(_)));
    assert!(!target.exists());
}
