// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Backend contract shared by every VCS driver.
//!
//! ```text
//!   Driver (factory, one per VCS implementation)
//!     name / vcs_name / capabilities / feature_extra
//!     open(path)   ──► Arc<dyn Backend>   or BackendUnavailable
//!     create(path, from, credentials)
//!
//!   Backend (instance bound to one repository root)
//!     status    branch, change, changes
//!     branches  set_branch, branches, editable_branches, create/delete_branch
//!     stage     stage, unstage, stage_all, unstage_all
//!     commit    commit, undo_commit
//!     remote    fetch, pull, push
//!     undo      undo_change, undo_change_all
//!     history   tags, get_last_commits
//! ```
//!
//! Every operation has a default body returning a not-implemented
//! [`FeatureError`]; a driver overrides exactly the operations it advertises
//! in its [`Capability`] mask.

pub mod git;
pub mod hg;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::change::{ChangeRecord, CommitRecord};
use crate::credentials::{CredentialKey, Credentials};
use crate::error::{FeatureError, VcsError, VcsResult};
use crate::feature::{
    self, Capability, CapabilityGroup, Feature, FeatureExtra, Method, Operation, Property,
    PropertyOp,
};

/// Commits to pull and to push after a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub to_pull: u64,
    /// `None` when pushing is not meaningful for the backend.
    pub to_push: Option<u64>,
}

/// Builds the feature handle for `op` from a capability mask.
#[must_use]
pub fn feature_for(capabilities: Capability, op: Operation, extra: FeatureExtra) -> Feature {
    Feature::new(op, capabilities.contains(op.capability()), extra)
}

/// A VCS implementation able to open or create repositories.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Unique driver name.
    fn name(&self) -> &'static str;

    /// Canonical VCS name shared by drivers of the same system.
    fn vcs_name(&self) -> &'static str;

    /// Operations this driver implements.
    fn capabilities(&self) -> Capability;

    /// Extra metadata for `op`.
    fn feature_extra(&self, _op: Operation) -> FeatureExtra {
        FeatureExtra::new()
    }

    fn feature(&self, op: Operation) -> Feature {
        feature_for(self.capabilities(), op, self.feature_extra(op))
    }

    /// Number of enabled operations in `group`.
    fn check(&self, group: CapabilityGroup) -> usize {
        feature::check(self.capabilities(), group)
    }

    /// Whether every operation in `group` is enabled.
    fn check_all(&self, group: CapabilityGroup) -> bool {
        feature::check_all(self.capabilities(), group)
    }

    /// Opens the repository containing `path`.
    ///
    /// # Errors
    ///
    /// `BackendUnavailable` when a dependency is missing or `path` is not
    /// inside a repository.
    fn open(&self, path: &Path) -> VcsResult<Arc<dyn Backend>>;

    /// Creates a repository at `path`, optionally populated from `from`.
    ///
    /// # Errors
    ///
    /// Not-implemented `FeatureError` unless the driver supports creation.
    fn create(
        &self,
        _path: &Path,
        _from: Option<&str>,
        _credentials: Option<Credentials>,
    ) -> VcsResult<Arc<dyn Backend>> {
        Err(FeatureError::not_implemented(self.feature(Operation::Method(Method::Create))).into())
    }
}

/// An open repository.
///
/// Operations on one instance are not serialized; callers must not issue
/// conflicting mutations concurrently.
#[allow(unused_variables)]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Name of the driver that opened this repository.
    fn driver_name(&self) -> &'static str;

    fn vcs_name(&self) -> &'static str;

    /// Canonical repository root.
    fn repodir(&self) -> &Path;

    fn capabilities(&self) -> Capability;

    fn feature_extra(&self, op: Operation) -> FeatureExtra {
        FeatureExtra::new()
    }

    fn feature(&self, op: Operation) -> Feature {
        feature_for(self.capabilities(), op, self.feature_extra(op))
    }

    fn check(&self, group: CapabilityGroup) -> usize {
        feature::check(self.capabilities(), group)
    }

    fn check_all(&self, group: CapabilityGroup) -> bool {
        feature::check_all(self.capabilities(), group)
    }

    /// Not-implemented error for `op`.
    fn unsupported(&self, op: Operation) -> VcsError {
        FeatureError::not_implemented(self.feature(op)).into()
    }

    /// Credential keys the backend needs for remote operations.
    fn required_credentials(&self) -> &[CredentialKey] {
        &[]
    }

    /// Last resolved credentials.
    fn credentials(&self) -> VcsResult<Credentials> {
        Err(self.unsupported(Operation::Property(Property::Credentials, PropertyOp::Get)))
    }

    /// Resolves or stores credentials; see [`crate::credentials::KeyringCredentials::apply`].
    fn set_credentials(&self, credentials: Credentials) -> VcsResult<()> {
        Err(self.unsupported(Operation::Property(Property::Credentials, PropertyOp::Set)))
    }

    /// Forgets the resolved credentials. The persistent store is untouched.
    fn clear_credentials(&self) -> VcsResult<()> {
        Err(self.unsupported(Operation::Property(Property::Credentials, PropertyOp::Del)))
    }

    /// Every reportable change in the working tree.
    fn changes(&self) -> VcsResult<Vec<ChangeRecord>> {
        Err(self.unsupported(Operation::Property(Property::Changes, PropertyOp::Get)))
    }

    /// The change for one path. Staged wins over unstaged unless
    /// `prefer_unstaged` is set.
    fn change(&self, path: &str, prefer_unstaged: bool) -> VcsResult<Option<ChangeRecord>> {
        Err(self.unsupported(Operation::Method(Method::Change)))
    }

    fn branch(&self) -> VcsResult<String> {
        Err(self.unsupported(Operation::Property(Property::Branch, PropertyOp::Get)))
    }

    fn set_branch(&self, name: &str) -> VcsResult<()> {
        Err(self.unsupported(Operation::Property(Property::Branch, PropertyOp::Set)))
    }

    fn branches(&self) -> VcsResult<Vec<String>> {
        Err(self.unsupported(Operation::Property(Property::Branches, PropertyOp::Get)))
    }

    /// Branches that may be checked out and changed; defaults to [`Self::branches`].
    fn editable_branches(&self) -> VcsResult<Vec<String>> {
        if self.capabilities().contains(Capability::EDITABLE_BRANCHES_GET) {
            self.branches()
        } else {
            Err(self.unsupported(Operation::Property(
                Property::EditableBranches,
                PropertyOp::Get,
            )))
        }
    }

    fn tags(&self) -> VcsResult<Vec<String>> {
        Err(self.unsupported(Operation::Property(Property::Tags, PropertyOp::Get)))
    }

    fn create_branch(&self, name: &str, empty: bool) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::CreateBranch)))
    }

    fn delete_branch(&self, name: &str) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::DeleteBranch)))
    }

    fn stage(&self, path: &str) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::Stage)))
    }

    fn unstage(&self, path: &str) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::Unstage)))
    }

    fn stage_all(&self) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::StageAll)))
    }

    fn unstage_all(&self) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::UnstageAll)))
    }

    /// Commits staged changes. `is_path = None` probes whether `message`
    /// names a file.
    fn commit(&self, message: &str, is_path: Option<bool>) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::Commit)))
    }

    /// Counts commits to pull and push. Only contacts the remote when `sync`.
    fn fetch(&self, sync: bool) -> VcsResult<FetchStatus> {
        Err(self.unsupported(Operation::Method(Method::Fetch)))
    }

    fn pull(&self) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::Pull)))
    }

    fn push(&self) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::Push)))
    }

    /// Undoes the last `commits` commits, keeping their changes staged.
    /// Returns the oldest undone commit when history is supported.
    fn undo_commit(&self, commits: usize) -> VcsResult<Option<CommitRecord>> {
        Err(self.unsupported(Operation::Method(Method::UndoCommit)))
    }

    fn undo_change(&self, path: &str) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::UndoChange)))
    }

    fn undo_change_all(&self) -> VcsResult<bool> {
        Err(self.unsupported(Operation::Method(Method::UndoChangeAll)))
    }

    /// The newest `commits` commits, newest first.
    fn get_last_commits(&self, commits: usize) -> VcsResult<Vec<CommitRecord>> {
        Err(self.unsupported(Operation::Method(Method::GetLastCommits)))
    }
}

static URL_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?:file://.+|[A-Za-z][A-Za-z0-9+.-]*://[^/\s]+/\S+)$"));

/// Checks that `url` is `scheme://host/path` or `file://path`.
///
/// # Errors
///
/// `InvalidArgument` for anything else.
pub fn validate_remote_url(url: &str) -> VcsResult<()> {
    let pattern = URL_REGEX
        .as_ref()
        .map_err(|err| VcsError::other(format!("failed to compile url regex: {err}")))?;
    if pattern.is_match(url) {
        Ok(())
    } else {
        Err(VcsError::invalid_argument(format!("{url:?} is not a valid url")))
    }
}
