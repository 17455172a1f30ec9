// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git driver built on the `git` executable.
//!
//! ```text
//! GitDriver { GitSettings }
//!     open(path) --> which git --> rev-parse --show-toplevel --> GitBackend
//!     create(path, from, credentials) --> init, remote add, fetch, checkout
//!                                          (rollback on any failure)
//!
//! GitBackend
//!     runner       GitRunner (prompts disabled, repodir/.git checked)
//!     credentials  Arc<GitCredentials> (keyring, keyed by origin URL)
//!     interactive  remote ops through a pty when true
//! ```

mod command;
mod create;
mod history;
mod remote;
mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Driver, FetchStatus};
use crate::change::{ChangeKind, ChangeRecord, CommitRecord};
use crate::core::process::builder::ProcessBuilder;
use crate::credentials::{
    CredentialKey, CredentialStore, Credentials, CredentialsHandle, KeyringCredentials,
    KeyringSecrets, SecretStorage,
};
use crate::error::{BackendUnavailable, FeatureError, PropertyError, VcsError, VcsResult};
use crate::feature::{Capability, FeatureExtra, Method, Operation, Property, PropertyOp};

pub use command::{GitRunner, escape_path, git_command};
pub use history::{COMMIT_ATTRS, LOG_FORMAT, parse_history, parse_record};
pub use remote::{AuthMode, GitCredentials, RemoteOp, git_prompts};
pub use status::{
    BranchStatus, StatusEntry, StatusReport, code_kind, parse_branch_header, parse_status,
};

pub const DRIVER_NAME: &str = "git";
pub const VCS_NAME: &str = "git";

/// Keyring scope for Git credentials.
pub const DEFAULT_SCOPE: &str = "spyder-vcs-git";

pub const REQUIRED_CREDENTIALS: [CredentialKey; 2] =
    [CredentialKey::Username, CredentialKey::Password];

/// Everything except credentials, which depend on the auth mode.
const BASE_CAPABILITIES: Capability = Capability::CREATE
    .union(Capability::CHANGES_GET)
    .union(Capability::CHANGE)
    .union(Capability::BRANCH_GET)
    .union(Capability::BRANCH_SET)
    .union(Capability::BRANCHES_GET)
    .union(Capability::EDITABLE_BRANCHES_GET)
    .union(Capability::CREATE_BRANCH)
    .union(Capability::DELETE_BRANCH)
    .union(Capability::STAGE)
    .union(Capability::UNSTAGE)
    .union(Capability::STAGE_ALL)
    .union(Capability::UNSTAGE_ALL)
    .union(Capability::COMMIT)
    .union(Capability::FETCH)
    .union(Capability::PUSH)
    .union(Capability::PULL)
    .union(Capability::UNDO_COMMIT)
    .union(Capability::UNDO_CHANGE)
    .union(Capability::UNDO_CHANGE_ALL)
    .union(Capability::GET_LAST_COMMITS)
    .union(Capability::TAGS_GET);

const CREDENTIAL_CAPABILITIES: Capability = Capability::CREDENTIALS_GET
    .union(Capability::CREDENTIALS_SET)
    .union(Capability::CREDENTIALS_DEL);

const fn capabilities_for(interactive: bool) -> Capability {
    if interactive {
        BASE_CAPABILITIES.union(CREDENTIAL_CAPABILITIES)
    } else {
        BASE_CAPABILITIES
    }
}

fn git_feature_extra(op: Operation) -> FeatureExtra {
    let mut extra = FeatureExtra::new();
    match op {
        Operation::Property(Property::Changes, PropertyOp::Get)
        | Operation::Method(Method::Change) => {
            extra.insert("states".into(), json!(["path", "kind", "staged"]));
        }
        Operation::Method(Method::CreateBranch) => {
            extra.insert("empty".into(), json!(true));
        }
        Operation::Method(Method::GetLastCommits) => {
            extra.insert("attrs".into(), json!(COMMIT_ATTRS));
        }
        Operation::Property(Property::Tags, PropertyOp::Get) => {
            extra.insert("branch".into(), json!(true));
        }
        _ => {}
    }
    extra
}

/// Settings shared by every repository the driver opens.
#[derive(Debug, Clone, Builder)]
pub struct GitSettings {
    /// Explicit git executable; `PATH` lookup otherwise.
    #[builder(into)]
    program: Option<PathBuf>,
    #[builder(default)]
    auth_mode: AuthMode,
    /// Per-phase timeout of interactive authentication.
    #[builder(default = Duration::from_secs(10))]
    auth_timeout: Duration,
    #[builder(default = Arc::new(KeyringSecrets) as Arc<dyn SecretStorage>)]
    secrets: Arc<dyn SecretStorage>,
    #[builder(into, default = DEFAULT_SCOPE.to_string())]
    scope: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GitSettings {
    #[must_use]
    pub const fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Finds the git executable.
    ///
    /// # Errors
    ///
    /// `BackendUnavailable` listing `git` as a missing program.
    pub fn locate(&self, directory: &Path) -> VcsResult<PathBuf> {
        let found = match &self.program {
            Some(program) => program.is_file().then(|| program.clone()),
            None => ProcessBuilder::find("git"),
        };
        found.ok_or_else(|| {
            BackendUnavailable::builder()
                .directory(directory)
                .driver(DRIVER_NAME)
                .programs(vec!["git".to_string()])
                .message("git executable not found")
                .build()
                .into()
        })
    }
}

/// Factory for [`GitBackend`].
#[derive(Debug, Clone, Default)]
pub struct GitDriver {
    settings: GitSettings,
}

impl GitDriver {
    #[must_use]
    pub const fn new(settings: GitSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &GitSettings {
        &self.settings
    }
}

impl Driver for GitDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn vcs_name(&self) -> &'static str {
        VCS_NAME
    }

    fn capabilities(&self) -> Capability {
        capabilities_for(self.settings.auth_mode.is_interactive())
    }

    fn feature_extra(&self, op: Operation) -> FeatureExtra {
        git_feature_extra(op)
    }

    fn open(&self, path: &Path) -> VcsResult<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = GitBackend::open(&self.settings, path)?;
        Ok(backend)
    }

    fn create(
        &self,
        path: &Path,
        from: Option<&str>,
        credentials: Option<Credentials>,
    ) -> VcsResult<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = self.create_repository(path, from, credentials)?;
        Ok(backend)
    }
}

/// An open Git repository.
#[derive(Debug)]
pub struct GitBackend {
    runner: GitRunner,
    credentials: Arc<GitCredentials>,
    interactive: bool,
    auth_timeout: Duration,
    capabilities: Capability,
}

impl GitBackend {
    /// Opens the repository containing `path`.
    ///
    /// # Errors
    ///
    /// `BackendUnavailable` when git is missing or `path` is not inside a
    /// work tree.
    pub fn open(settings: &GitSettings, path: &Path) -> VcsResult<Arc<Self>> {
        let program = settings.locate(path)?;
        let not_a_repository = |raw: &str| -> VcsError {
            BackendUnavailable::builder()
                .directory(path)
                .driver(DRIVER_NAME)
                .is_valid_repository(false)
                .message("not a git repository")
                .raw(raw)
                .build()
                .into()
        };
        if !path.is_dir() {
            return Err(not_a_repository("not a directory"));
        }

        let output = git_command(&program, path, ["rev-parse", "--show-toplevel"]).run()?;
        let toplevel = output.stdout_trimmed();
        if !output.success() || toplevel.is_empty() {
            return Err(not_a_repository(output.diagnostic()));
        }
        let repodir = PathBuf::from(toplevel);
        debug!(repodir = %repodir.display(), "opened git repository");

        let interactive = settings.auth_mode.is_interactive();
        let runner = GitRunner::new(program, repodir);
        let resolver = KeyringCredentials::new(
            CredentialStore::new(settings.scope.clone(), Arc::clone(&settings.secrets)),
            REQUIRED_CREDENTIALS.to_vec(),
        );
        let credentials = Arc::new(GitCredentials::new(runner.clone(), resolver));
        if interactive {
            credentials.preload();
        }

        Ok(Arc::new(Self {
            runner,
            credentials,
            interactive,
            auth_timeout: settings.auth_timeout,
            capabilities: capabilities_for(interactive),
        }))
    }

    #[must_use]
    pub const fn runner(&self) -> &GitRunner {
        &self.runner
    }

    /// Handle for refreshing this repository's credentials.
    #[must_use]
    pub fn credentials_handle(&self) -> Arc<GitCredentials> {
        Arc::clone(&self.credentials)
    }

    fn ensure_enabled(&self, op: Operation) -> VcsResult<()> {
        if self.capabilities.contains(op.capability()) {
            Ok(())
        } else {
            Err(self.unsupported(op))
        }
    }

    /// `PropertyError` for property accessors, `FeatureError` otherwise.
    fn failure(&self, op: Operation, message: impl Into<String>, raw: &str) -> VcsError {
        match op {
            Operation::Property(name, action) => {
                PropertyError::new(name, action, message).with_raw(raw).into()
            }
            Operation::Method(_) => FeatureError::new(self.feature(op), message)
                .with_raw(raw)
                .into(),
        }
    }

    fn status(&self, op: Operation, pathspec: &str, with_branch: bool) -> VcsResult<StatusReport> {
        let output = self.runner.run([
            "status",
            if with_branch { "-bz" } else { "-z" },
            "-uall",
            "--porcelain=v1",
            "--ignore-submodule=all",
            escape_path(pathspec).as_str(),
        ])?;
        if !output.success() {
            return Err(self.failure(op, "failed to read git status", output.diagnostic()));
        }
        let mut report = parse_status(output.stdout(), with_branch)?;
        report.collapse(pathspec);
        Ok(report)
    }

    /// Ref names listed by `git <args> --format %(refname:lstrip=2)`.
    fn list_refs(&self, op: Operation, args: &[&str]) -> VcsResult<Vec<String>> {
        let output = self
            .runner
            .run(args.iter().copied().chain(["--format", "%(refname:lstrip=2)"]))?;
        if !output.success() {
            return Err(self.failure(op, "failed to list refs", output.diagnostic()));
        }
        Ok(output
            .stdout()
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn local_branches(&self, op: Operation) -> VcsResult<Vec<String>> {
        self.list_refs(op, &["branch"])
    }

    fn commit_count(&self) -> VcsResult<usize> {
        let op = Operation::Method(Method::UndoCommit);
        let output = self
            .runner
            .run(["rev-list", "HEAD", "--count", "--first-parent"])?;
        if !output.success() {
            return Err(self.failure(op, "failed to count commits", output.diagnostic()));
        }
        output
            .stdout_trimmed()
            .parse()
            .map_err(|_| self.failure(op, "unexpected rev-list output", output.stdout()))
    }

    fn commit_at(&self, revision: &str) -> VcsResult<Option<CommitRecord>> {
        let output = self.runner.run([
            "log",
            "-1",
            "--date=unix",
            format!("--pretty={LOG_FORMAT}").as_str(),
            revision,
        ])?;
        Ok(output
            .success()
            .then(|| parse_history(output.stdout()).into_iter().next())
            .flatten())
    }

    fn repo_path(&self, path: &str) -> PathBuf {
        self.runner.repodir().join(path)
    }
}

impl Backend for GitBackend {
    fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn vcs_name(&self) -> &'static str {
        VCS_NAME
    }

    fn repodir(&self) -> &Path {
        self.runner.repodir()
    }

    fn capabilities(&self) -> Capability {
        self.capabilities
    }

    fn feature_extra(&self, op: Operation) -> FeatureExtra {
        git_feature_extra(op)
    }

    fn required_credentials(&self) -> &[CredentialKey] {
        self.credentials.resolver().required()
    }

    fn credentials(&self) -> VcsResult<Credentials> {
        self.ensure_enabled(Operation::Property(Property::Credentials, PropertyOp::Get))?;
        Ok(self.credentials.current())
    }

    fn set_credentials(&self, credentials: Credentials) -> VcsResult<()> {
        self.ensure_enabled(Operation::Property(Property::Credentials, PropertyOp::Set))?;
        self.credentials.apply(credentials)
    }

    fn clear_credentials(&self) -> VcsResult<()> {
        self.ensure_enabled(Operation::Property(Property::Credentials, PropertyOp::Del))?;
        self.credentials.resolver().clear();
        Ok(())
    }

    fn changes(&self) -> VcsResult<Vec<ChangeRecord>> {
        let op = Operation::Property(Property::Changes, PropertyOp::Get);
        Ok(self.status(op, ".", false)?.records())
    }

    fn change(&self, path: &str, prefer_unstaged: bool) -> VcsResult<Option<ChangeRecord>> {
        let mut records = self
            .status(Operation::Method(Method::Change), path, false)?
            .records();
        Ok(match records.len() {
            0 => None,
            1 => records.pop(),
            // unstaged first, staged second
            _ => Some(records.swap_remove(usize::from(!prefer_unstaged))),
        })
    }

    fn branch(&self) -> VcsResult<String> {
        let output = self.runner.run(["symbolic-ref", "--short", "HEAD"])?;
        let name = output.stdout_trimmed();
        if output.success() && !name.is_empty() {
            Ok(name.to_string())
        } else {
            Err(self.failure(
                Operation::Property(Property::Branch, PropertyOp::Get),
                "HEAD is not on a branch",
                output.diagnostic(),
            ))
        }
    }

    fn set_branch(&self, name: &str) -> VcsResult<()> {
        let op = Operation::Property(Property::Branch, PropertyOp::Set);
        let output = self.runner.run(["checkout", name])?;
        if !output.success() {
            return Err(self.failure(op, format!("cannot checkout {name:?}"), output.diagnostic()));
        }
        match self.branch() {
            Ok(current) if current == name => Ok(()),
            // tags check out as a detached HEAD
            _ if self.tags().is_ok_and(|tags| tags.iter().any(|tag| tag == name)) => Ok(()),
            Ok(current) => Err(self.failure(
                op,
                format!("branch is {current:?} after checkout of {name:?}"),
                output.diagnostic(),
            )),
            Err(err) => Err(self.failure(op, err.to_string(), output.diagnostic())),
        }
    }

    fn branches(&self) -> VcsResult<Vec<String>> {
        let op = Operation::Property(Property::Branches, PropertyOp::Get);
        let mut branches = self.local_branches(op)?;
        for args in [&["tag", "-l"][..], &["branch", "-r", "-l"]] {
            match self.list_refs(op, args) {
                Ok(refs) => branches.extend(refs),
                Err(err) => warn!(?args, error = %err, "failed to list refs"),
            }
        }
        Ok(branches)
    }

    fn editable_branches(&self) -> VcsResult<Vec<String>> {
        self.local_branches(Operation::Property(
            Property::EditableBranches,
            PropertyOp::Get,
        ))
    }

    fn tags(&self) -> VcsResult<Vec<String>> {
        self.list_refs(Operation::Property(Property::Tags, PropertyOp::Get), &["tag", "-l"])
    }

    fn create_branch(&self, name: &str, empty: bool) -> VcsResult<bool> {
        let op = Operation::Method(Method::CreateBranch);
        if self.branches()?.iter().any(|branch| branch == name) {
            return Err(self.failure(op, format!("branch {name:?} already exists"), ""));
        }

        let flag = if empty { "--orphan" } else { "-b" };
        let output = self.runner.run(["checkout", flag, name])?;
        if !output.success() {
            return Err(self.failure(
                op,
                format!("cannot create branch {name:?}"),
                output.diagnostic(),
            ));
        }

        if empty {
            let has_content = std::fs::read_dir(self.runner.repodir())?
                .filter_map(Result::ok)
                .any(|entry| entry.file_name() != ".git");
            if has_content {
                let output = self.runner.run(["rm", "-rf", "."])?;
                if !output.success() {
                    return Err(self.failure(op, "cannot empty the work tree", output.diagnostic()));
                }
            }
        }
        info!(branch = name, empty, "created branch");
        Ok(true)
    }

    fn delete_branch(&self, name: &str) -> VcsResult<bool> {
        let output = self.runner.run(["branch", "-d", name])?;
        if output.success() {
            Ok(true)
        } else {
            Err(self.failure(
                Operation::Method(Method::DeleteBranch),
                format!("cannot delete branch {name:?}"),
                output.diagnostic(),
            ))
        }
    }

    fn stage(&self, path: &str) -> VcsResult<bool> {
        let output = self.runner.run(["add", escape_path(path).as_str()])?;
        // a vanished path may already be staged as removed
        if !output.success() && self.repo_path(path).exists() {
            return Ok(false);
        }
        Ok(self
            .change(path, true)?
            .is_some_and(|change| change.staged))
    }

    fn unstage(&self, path: &str) -> VcsResult<bool> {
        let output = self.runner.run(["reset", "--", escape_path(path).as_str()])?;
        if !output.success() {
            return Ok(false);
        }
        Ok(self
            .change(path, false)?
            .is_none_or(|change| !change.staged))
    }

    fn stage_all(&self) -> VcsResult<bool> {
        self.stage(".")
    }

    fn unstage_all(&self) -> VcsResult<bool> {
        self.unstage(".")
    }

    fn commit(&self, message: &str, is_path: Option<bool>) -> VcsResult<bool> {
        let is_path = is_path.unwrap_or_else(|| Path::new(message).is_file());
        let mut args = vec!["commit".to_string()];
        if is_path {
            let file = std::fs::canonicalize(message).unwrap_or_else(|_| PathBuf::from(message));
            args.push("-F".to_string());
            args.push(file.to_string_lossy().into_owned());
        } else {
            if message.trim().is_empty() {
                return Ok(false);
            }
            for paragraph in message.split("\n\n") {
                args.push("-m".to_string());
                args.push(paragraph.to_string());
            }
        }

        let output = self.runner.run(&args)?;
        if output.success() {
            Ok(true)
        } else {
            Err(self.failure(
                Operation::Method(Method::Commit),
                "git commit failed",
                output.diagnostic(),
            ))
        }
    }

    fn fetch(&self, sync: bool) -> VcsResult<FetchStatus> {
        if sync {
            self.remote_operation(RemoteOp::Fetch)?;
        }
        let branch = self
            .status(Operation::Method(Method::Fetch), ".git", true)?
            .branch
            .unwrap_or_default();
        Ok(FetchStatus {
            to_pull: branch.behind,
            to_push: Some(branch.ahead),
        })
    }

    fn pull(&self) -> VcsResult<bool> {
        self.remote_operation(RemoteOp::Pull)
    }

    fn push(&self) -> VcsResult<bool> {
        self.remote_operation(RemoteOp::Push)
    }

    fn undo_commit(&self, commits: usize) -> VcsResult<Option<CommitRecord>> {
        let op = Operation::Method(Method::UndoCommit);
        if commits < 1 {
            return Err(VcsError::invalid_argument(
                "only numbers greater or equal than 1 are allowed",
            ));
        }
        let commits = commits.min(self.commit_count()?.saturating_sub(1));
        if commits == 0 {
            return Err(self.failure(op, "no commits to undo", ""));
        }

        let undone = if self.capabilities.contains(Capability::GET_LAST_COMMITS) {
            self.commit_at(&format!("HEAD~{}", commits - 1))
                .ok()
                .flatten()
        } else {
            None
        };

        let output = self
            .runner
            .run(["reset", "--soft", format!("HEAD~{commits}").as_str()])?;
        if !output.success() {
            return Err(self.failure(op, "git reset failed", output.diagnostic()));
        }
        info!(commits, "undid commits");
        Ok(undone)
    }

    fn undo_change(&self, path: &str) -> VcsResult<bool> {
        let output = self.runner.run(["checkout", "--", escape_path(path).as_str()])?;
        let mut change = self.change(path, true)?;
        if !output.success() {
            if !change.as_ref().is_some_and(|c| c.kind == ChangeKind::Added) {
                return Ok(false);
            }
            // untracked: git cannot restore it, so drop it
            let target = self.repo_path(path);
            if target.is_dir() {
                std::fs::remove_dir_all(&target)?;
            } else {
                std::fs::remove_file(&target)?;
            }
            change = self.change(path, true)?;
        }

        if path == "." {
            return Ok(self
                .changes()?
                .iter()
                .all(|record| record.staged || record.kind == ChangeKind::Added));
        }
        Ok(change.is_none_or(|change| change.staged))
    }

    fn undo_change_all(&self) -> VcsResult<bool> {
        self.undo_change(".")
    }

    fn get_last_commits(&self, commits: usize) -> VcsResult<Vec<CommitRecord>> {
        if commits < 1 {
            return Err(VcsError::invalid_argument(
                "only numbers greater or equal than 1 are allowed",
            ));
        }
        let output = self.runner.run([
            "log",
            format!("-{commits}").as_str(),
            "--date=unix",
            format!("--pretty={LOG_FORMAT}").as_str(),
        ])?;
        if !output.success() {
            return Err(self.failure(
                Operation::Method(Method::GetLastCommits),
                "failed to get git history",
                output.diagnostic(),
            ));
        }
        Ok(parse_history(output.stdout()))
    }
}

#[cfg(test)]
mod tests;
