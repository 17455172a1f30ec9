// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the git driver.
//!
//! Runs full workflows against real temporary repositories through the
//! backend manager.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;
use vcal::backend::Backend;
use vcal::backend::git::{AuthMode, GitDriver, GitSettings};
use vcal::change::{ChangeKind, ChangeRecord};
use vcal::credentials::MemorySecrets;
use vcal::error::VcsError;
use vcal::feature::{Property, PropertyOp};
use vcal::manager::BackendManager;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn manager() -> BackendManager {
    let settings = GitSettings::builder()
        .auth_mode(AuthMode::NonInteractive)
        .secrets(Arc::new(MemorySecrets::new()))
        .build();
    let mut manager = BackendManager::new();
    manager.register(Arc::new(GitDriver::new(settings)));
    manager
}

/// Helper to run git commands in a directory
fn run_git(args: &[&str], cwd: &Path) {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
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
}

fn set_identity(dir: &Path) {
    run_git(&["config", "user.email", "test@example.com"], dir);
    run_git(&["config", "user.name", "Test"], dir);
}

/// Creates a repository through the manager with a committer identity.
fn create_repo(manager: &mut BackendManager, dir: &Path) -> Arc<dyn Backend> {
    let backend = manager.create_with("git", dir, None, None).unwrap();
    set_identity(dir);
    backend
}

fn commit_file(backend: &dyn Backend, name: &str, content: &str, message: &str) {
    fs::write(backend.repodir().join(name), content).unwrap();
    assert!(backend.stage(name).unwrap());
    assert!(backend.commit(message, Some(false)).unwrap());
}

fn titles(backend: &dyn Backend, count: usize) -> Vec<String> {
    backend
        .get_last_commits(count)
        .unwrap()
        .into_iter()
        .filter_map(|record| record.title)
        .collect()
}

// =============================================================================
// Local workflows
// =============================================================================

#[test]
fn git_init_stage_and_commit() {
    let temp = temp_dir();
    let dir = temp.path().join("repo");
    let mut manager = manager();
    let backend = create_repo(&mut manager, &dir);
    assert!(dir.join(".git").is_dir());
    assert_eq!(backend.driver_name(), "git");
    assert!(manager.active().is_some());

    fs::write(dir.join("notes.txt"), "hello").unwrap();
    let changes = backend.changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "notes.txt");
    assert_eq!(changes[0].kind, ChangeKind::Added);
    assert!(!changes[0].staged);

    assert!(backend.stage("notes.txt").unwrap());
    let change = backend.change("notes.txt", false).unwrap().unwrap();
    assert!(change.staged);

    assert!(backend.commit("Add notes\n\nFirst file.", Some(false)).unwrap());
    assert!(backend.changes().unwrap().is_empty());

    let commits = backend.get_last_commits(1).unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].title.as_deref(), Some("Add notes"));
    assert_eq!(
        commits[0].description.as_deref().map(str::trim),
        Some("First file.")
    );
    assert_eq!(commits[0].author_username.as_deref(), Some("Test"));
}

#[test]
fn git_open_from_subdirectory() {
    let temp = temp_dir();
    let dir = temp.path().join("repo");
    let mut creator = manager();
    create_repo(&mut creator, &dir);
    fs::create_dir_all(dir.join("src/nested")).unwrap();

    let mut manager = manager();
    let backend = manager.open(&dir.join("src/nested")).unwrap().unwrap();
    assert_eq!(
        backend.repodir().canonicalize().unwrap(),
        dir.canonicalize().unwrap()
    );
}

#[test]
fn git_empty_message_is_not_committed() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    assert!(backend.stage("a.txt").unwrap());
    assert!(!backend.commit("   ", Some(false)).unwrap());
}

#[test]
fn git_undo_commit_keeps_changes_staged() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    commit_file(backend.as_ref(), "b.txt", "b", "B");
    commit_file(backend.as_ref(), "c.txt", "c", "C");

    let undone = backend.undo_commit(2).unwrap().unwrap();
    assert_eq!(undone.title.as_deref(), Some("B"));
    assert_eq!(titles(backend.as_ref(), 5), ["A"]);

    let mut staged: Vec<String> = backend
        .changes()
        .unwrap()
        .into_iter()
        .filter(|record| record.staged)
        .map(|record| record.path)
        .collect();
    staged.sort();
    assert_eq!(staged, ["b.txt", "c.txt"]);
}

#[test]
fn git_undo_commit_rejects_zero() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    assert!(matches!(
        backend.undo_commit(0).unwrap_err(),
        VcsError::InvalidArgument(_)
    ));
}

#[test]
fn git_undo_change_restores_and_drops_untracked() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "original", "A");

    fs::write(temp.path().join("a.txt"), "edited").unwrap();
    assert!(backend.undo_change("a.txt").unwrap());
    assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "original");

    fs::write(temp.path().join("scratch.txt"), "tmp").unwrap();
    assert!(backend.undo_change("scratch.txt").unwrap());
    assert!(!temp.path().join("scratch.txt").exists());
}

// =============================================================================
// Staging
// =============================================================================

#[test]
fn git_stage_all_and_unstage_all_cover_every_change() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "tracked.txt", "one", "Tracked");

    fs::write(temp.path().join("tracked.txt"), "two").unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    fs::write(temp.path().join("src/new.rs"), "fn main() {}").unwrap();
    fs::write(temp.path().join("notes.txt"), "notes").unwrap();

    assert!(backend.stage_all().unwrap());
    let staged = backend.changes().unwrap();
    assert_eq!(staged.len(), 3);
    assert!(staged.iter().all(|record| record.staged), "{staged:?}");

    assert!(backend.unstage_all().unwrap());
    let unstaged = backend.changes().unwrap();
    assert_eq!(unstaged.len(), 3);
    assert!(unstaged.iter().all(|record| !record.staged), "{unstaged:?}");
}

#[test]
fn git_stage_path_with_leading_dash() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");

    fs::write(temp.path().join("-draft.txt"), "draft").unwrap();
    assert!(backend.stage("-draft.txt").unwrap());
    let change = backend.change("-draft.txt", false).unwrap().unwrap();
    assert_eq!(change.path, "-draft.txt");
    assert!(change.staged);

    assert!(backend.unstage("-draft.txt").unwrap());
    let change = backend.change("-draft.txt", false).unwrap().unwrap();
    assert_eq!(change.kind, ChangeKind::Added);
    assert!(!change.staged);
}

#[test]
fn git_rename_reports_source_and_destination() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "alpha\nbeta\ngamma\n", "A");
    run_git(&["mv", "a.txt", "b.txt"], temp.path());

    let changes = backend.changes().unwrap();
    assert_eq!(
        changes,
        vec![
            ChangeRecord::new("a.txt", ChangeKind::Removed, true),
            ChangeRecord {
                comment: Some("from a.txt".to_string()),
                ..ChangeRecord::new("b.txt", ChangeKind::Added, true)
            },
        ]
    );

    let destination = backend.change("b.txt", false).unwrap().unwrap();
    assert_eq!(destination.kind, ChangeKind::Added);
    let source = backend.change("a.txt", false).unwrap().unwrap();
    assert_eq!(source.kind, ChangeKind::Removed);
}

// =============================================================================
// Branches
// =============================================================================

#[test]
fn git_branch_switching() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    let main = backend.branch().unwrap();

    assert!(backend.create_branch("feature", false).unwrap());
    assert_eq!(backend.branch().unwrap(), "feature");
    assert!(backend.editable_branches().unwrap().contains(&"feature".to_string()));

    backend.set_branch(&main).unwrap();
    assert_eq!(backend.branch().unwrap(), main);

    let err = backend.set_branch("does-not-exist").unwrap_err();
    match err {
        VcsError::Property(property) => {
            assert_eq!(property.name, Property::Branch);
            assert_eq!(property.operation, PropertyOp::Set);
        }
        other => panic!("expected a property error, got {other:?}"),
    }

    assert!(backend.delete_branch("feature").unwrap());
    assert!(!backend.branches().unwrap().contains(&"feature".to_string()));
}

#[test]
fn git_create_existing_branch_fails() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    let main = backend.branch().unwrap();
    assert!(matches!(
        backend.create_branch(&main, false).unwrap_err(),
        VcsError::Feature(_)
    ));
}

#[test]
fn git_create_empty_branch_is_orphan() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    fs::create_dir_all(temp.path().join("docs")).unwrap();
    commit_file(backend.as_ref(), "docs/guide.md", "# Guide", "Docs");

    let main = backend.branch().unwrap();

    assert!(backend.create_branch("pages", true).unwrap());
    assert_eq!(backend.branch().unwrap(), "pages");
    assert!(!temp.path().join("a.txt").exists());
    assert!(!temp.path().join("docs/guide.md").exists());
    assert!(temp.path().join(".git").is_dir());
    assert!(backend.changes().unwrap().is_empty());

    commit_file(backend.as_ref(), "index.html", "<h1>Pages</h1>", "Pages");
    // the orphan history starts fresh
    assert_eq!(titles(backend.as_ref(), 5), ["Pages"]);
    backend.set_branch(&main).unwrap();
    assert!(temp.path().join("a.txt").exists());
}

#[test]
fn git_branches_include_tags_and_remote_branches() {
    let temp = temp_dir();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    run_git(&["init", "--quiet", "-b", "main"], &source);
    fs::write(source.join("README.md"), "# Source").unwrap();
    run_git(&["add", "README.md"], &source);
    run_git(&["commit", "-m", "Initial"], &source);
    run_git(&["tag", "v1.0"], &source);

    let target = temp.path().join("clone");
    let url = format!("file://{}", source.display());
    let mut manager = manager();
    let backend = manager
        .create_with("git", &target, Some(url.as_str()), None)
        .unwrap();

    let branches = backend.branches().unwrap();
    assert!(branches.contains(&"main".to_string()), "{branches:?}");
    assert!(branches.contains(&"v1.0".to_string()), "{branches:?}");
    assert!(branches.contains(&"origin/main".to_string()), "{branches:?}");
    assert_eq!(backend.editable_branches().unwrap(), ["main"]);
}

#[test]
fn git_tags_can_be_checked_out() {
    let temp = temp_dir();
    let mut manager = manager();
    let backend = create_repo(&mut manager, temp.path());
    commit_file(backend.as_ref(), "a.txt", "a", "A");
    run_git(&["tag", "v1.0"], temp.path());

    assert_eq!(backend.tags().unwrap(), ["v1.0"]);
    backend.set_branch("v1.0").unwrap();
}

// =============================================================================
// Remotes
// =============================================================================

#[test]
fn git_create_from_file_remote() {
    let temp = temp_dir();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    run_git(&["init", "--quiet"], &source);
    fs::write(source.join("README.md"), "# Source").unwrap();
    run_git(&["add", "README.md"], &source);
    run_git(&["commit", "-m", "Initial"], &source);

    let target = temp.path().join("clone");
    let url = format!("file://{}", source.display());
    let mut manager = manager();
    let backend = manager
        .create_with("git", &target, Some(url.as_str()), None)
        .unwrap();

    assert_eq!(
        fs::read_to_string(target.join("README.md")).unwrap(),
        "# Source"
    );
    assert_eq!(titles(backend.as_ref(), 1), ["Initial"]);

    let status = backend.fetch(false).unwrap();
    assert_eq!(status.to_pull, 0);
    assert_eq!(status.to_push, Some(0));
}

#[test]
fn git_failed_clone_rolls_back() {
    let temp = temp_dir();
    let target = temp.path().join("nested/clone");
    let url = format!("file://{}", temp.path().join("missing").display());
    let mut manager = manager();
    let err = manager
        .create_with("git", &target, Some(url.as_str()), None)
        .unwrap_err();
    assert!(matches!(err, VcsError::Feature(_)));
    assert!(!temp.path().join("nested").exists());
    assert!(manager.active().is_none());
}

#[test]
fn git_create_rejects_invalid_url() {
    let temp = temp_dir();
    let target = temp.path().join("clone");
    let mut manager = manager();
    let err = manager
        .create_with("git", &target, Some("not a url"), None)
        .unwrap_err();
    assert!(matches!(err, VcsError::InvalidArgument(_)));
    assert!(!target.exists());
}
