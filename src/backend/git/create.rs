// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository creation with filesystem rollback.
//!
//! ```text
//! validate url ─► Rollback::prepare ─► init . ─► (from = None) ─► done
//!                                         │
//!                       remote add origin ─► credentials ─► fetch(sync)
//!                                         │
//!                       default branch ─► checkout -b B origin/B ─► branch -u
//!
//! any error after prepare: Rollback::run, then the error propagates
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{GitBackend, GitDriver, git_command};
use crate::backend::{Backend, Driver, validate_remote_url};
use crate::credentials::Credentials;
use crate::error::{FeatureError, VcsError, VcsResult};
use crate::feature::{Method, Operation};

/// Filesystem state to restore when creation fails.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Rollback {
    /// `path` existed and was empty: remove what was created inside it.
    ClearContents(PathBuf),
    /// `path` did not exist: remove the topmost directory created for it.
    RemoveTree(PathBuf),
}

impl Rollback {
    pub(super) fn prepare(path: &Path) -> VcsResult<Self> {
        if path.exists() {
            if !path.is_dir() || fs::read_dir(path)?.next().is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not an empty directory", path.display()),
                )
                .into());
            }
            return Ok(Self::ClearContents(path.to_path_buf()));
        }

        let topmost = path
            .ancestors()
            .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
            .last()
            .unwrap_or(path)
            .to_path_buf();
        fs::create_dir_all(path)?;
        debug!(
            path = %path.display(),
            created = %topmost.display(),
            "created repository directory"
        );
        Ok(Self::RemoveTree(topmost))
    }

    /// Best effort: failures are logged.
    pub(super) fn run(&self) {
        let result = match self {
            Self::ClearContents(dir) => fs::read_dir(dir).and_then(|entries| {
                for entry in entries {
                    let entry = entry?;
                    if entry.file_type()?.is_dir() {
                        fs::remove_dir_all(entry.path())?;
                    } else {
                        fs::remove_file(entry.path())?;
                    }
                }
                Ok(())
            }),
            Self::RemoveTree(dir) => fs::remove_dir_all(dir),
        };
        match result {
            Ok(()) => info!(rollback = ?self, "rolled back repository creation"),
            Err(err) => warn!(rollback = ?self, error = %err, "rollback failed"),
        }
    }
}

impl GitDriver {
    pub(super) fn create_repository(
        &self,
        path: &Path,
        from: Option<&str>,
        credentials: Option<Credentials>,
    ) -> VcsResult<Arc<GitBackend>> {
        let program = self.settings.locate(path)?;
        if let Some(url) = from {
            validate_remote_url(url)?;
        }

        let rollback = Rollback::prepare(path)?;
        let result = self.populate(&program, path, from, credentials);
        if result.is_err() {
            rollback.run();
        }
        result
    }

    fn populate(
        &self,
        program: &Path,
        path: &Path,
        from: Option<&str>,
        credentials: Option<Credentials>,
    ) -> VcsResult<Arc<GitBackend>> {
        let init = git_command(program, path, ["init", "."]).run()?;
        if !init.success() {
            return Err(self.create_failed("git init failed", init.diagnostic()));
        }
        let backend = GitBackend::open(&self.settings, path)?;
        info!(repodir = %backend.repodir().display(), "initialized git repository");

        let Some(url) = from else {
            return Ok(backend);
        };

        let output = backend.runner.run(["remote", "add", "origin", url])?;
        if !output.success() {
            return Err(self.create_failed("cannot add origin", output.diagnostic()));
        }
        if let Some(credentials) = credentials {
            backend.set_credentials(credentials)?;
        }
        backend.fetch(true)?;

        let branch = self.default_branch(&backend)?;
        let upstream = format!("origin/{branch}");
        let checkout = backend
            .runner
            .run(["checkout", "-b", branch.as_str(), upstream.as_str()])?;
        if checkout.success() {
            let output = backend.runner.run(["branch", "-u", upstream.as_str()])?;
            if !output.success() {
                warn!(branch = %branch, stderr = %output.stderr(), "cannot set upstream");
            }
        } else {
            debug!(branch = %branch, stderr = %checkout.stderr(), "no remote branch to check out");
        }
        info!(url, branch = %branch, "populated repository from remote");
        Ok(backend)
    }

    fn create_failed(&self, message: &str, raw: &str) -> VcsError {
        FeatureError::new(self.feature(Operation::Method(Method::Create)), message)
            .with_raw(raw)
            .into()
    }

    /// Remote default branch, or the local one when the remote has no HEAD.
    fn default_branch(&self, backend: &GitBackend) -> VcsResult<String> {
        if let Some(remote_head) = backend
            .runner
            .query(["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])?
        {
            return Ok(remote_head
                .strip_prefix("origin/")
                .unwrap_or(&remote_head)
                .to_string());
        }
        match backend.runner.query(["symbolic-ref", "--short", "HEAD"])? {
            Some(head) if !head.is_empty() => Ok(head),
            _ => Err(self.create_failed("cannot determine the default branch", "")),
        }
    }
}

