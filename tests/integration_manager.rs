// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for driver selection with the built-in drivers.

use std::sync::Arc;

use tempfile::TempDir;
use vcal::backend::git::{AuthMode, GitDriver, GitSettings};
use vcal::backend::hg::HgDriver;
use vcal::error::VcsError;
use vcal::feature::{Method, Operation};
use vcal::manager::BackendManager;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Git plus an hg driver whose executable does not exist.
fn manager() -> BackendManager {
    let settings = GitSettings::builder()
        .auth_mode(AuthMode::NonInteractive)
        .secrets(Arc::new(vcal::credentials::MemorySecrets::new()))
        .build();
    let mut manager = BackendManager::new();
    manager.register(Arc::new(HgDriver::with_program("/nonexistent/bin/hg")));
    manager.register(Arc::new(GitDriver::new(settings)));
    manager
}

#[test]
fn manager_lists_registered_systems() {
    let mut manager = manager();
    manager.sort();
    assert!(!manager.is_dirty());
    assert_eq!(manager.vcs_types(), ["mercurial", "git"]);
    assert_eq!(manager.create_vcs_types(), ["git"]);
    // one driver per system, in registration order
    assert_eq!(manager.probe_order(), ["hg", "git"]);
}

#[test]
fn manager_opens_git_repository() {
    let temp = temp_dir();
    let mut manager = manager();
    manager.create_with("git", temp.path(), None, None).unwrap();

    let mut fresh = self::manager();
    let backend = fresh.open(temp.path()).unwrap().unwrap();
    assert_eq!(backend.driver_name(), "git");
    assert!(fresh.broken_drivers().is_empty());
    assert_eq!(
        fresh.repodir().map(|dir| dir.canonicalize().unwrap()),
        Some(temp.path().canonicalize().unwrap())
    );
}

#[test]
fn manager_plain_directory_has_no_backend() {
    let temp = temp_dir();
    let mut manager = manager();
    let err = manager.open(temp.path()).unwrap_err();
    assert!(matches!(err, VcsError::NoBackend(_)));
    // unavailable drivers are not broken
    assert!(manager.broken_drivers().is_empty());
    assert!(manager.active().is_none());
}

#[test]
fn manager_safe_check_respects_auth_mode() {
    let temp = temp_dir();
    let mut manager = manager();
    manager.create_with("git", temp.path(), None, None).unwrap();

    let commit = manager.safe_check("commit", None).unwrap();
    assert_eq!(commit.operation(), Operation::Method(Method::Commit));
    assert!(manager.safe_check("branch", Some("setter")).is_some());
    assert!(manager.safe_check("credentials", Some("get")).is_none());
    assert!(manager.safe_check("no_such_feature", None).is_none());
}

#[test]
fn manager_create_without_capable_driver_is_not_implemented() {
    let temp = temp_dir();
    let mut manager = manager();
    let err = manager
        .create_with("mercurial", &temp.path().join("repo"), None, None)
        .unwrap_err();
    match err {
        VcsError::Feature(feature) => assert!(!feature.feature.enabled),
        other => panic!("expected a feature error, got {other:?}"),
    }
    assert!(!temp.path().join("repo").exists());
}
