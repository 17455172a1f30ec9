// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote and repository creation commands.
//!
//! These run on the dispatcher so an authentication failure can prompt for
//! credentials and retry:
//!
//! ```text
//! run_*_command --> dispatch(op) --> worker: op()
//!                        ^              |
//!                        |   AuthError  v
//!                        +---- TerminalPrompt
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;

use crate::backend::{Backend, FetchStatus};
use crate::cli::remote::{FetchArgs, InitArgs};
use crate::cmd::prompt::TerminalPrompt;
use crate::cmd::{build_manager, dispatch};
use crate::config::Config;
use crate::credentials::{Credentials, CredentialsHandle};
use crate::error::{Result, VcsError, VcsResult};

/// Human-readable fetch summary.
#[must_use]
pub fn format_fetch_status(status: &FetchStatus) -> String {
    match status.to_push {
        Some(to_push) => format!("{} to pull, {to_push} to push", status.to_pull),
        None => format!("{} to pull", status.to_pull),
    }
}

/// Counts commits to pull and push, optionally updating remote refs first.
///
/// # Errors
///
/// Returns an error if the remote cannot be reached or authentication fails.
pub fn run_fetch_command(
    args: &FetchArgs,
    backend: Arc<dyn Backend>,
    config: &Config,
) -> Result<()> {
    let sync = args.sync;
    let status = dispatch(
        config.dispatcher.settings(),
        Box::new(TerminalPrompt),
        move || backend.fetch(sync),
    )?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", format_fetch_status(&status));
    }
    Ok(())
}

/// Pulls from the remote.
///
/// # Errors
///
/// Returns an error if the pull fails or authentication fails.
pub fn run_pull_command(backend: Arc<dyn Backend>, config: &Config) -> Result<()> {
    let pulled = dispatch(
        config.dispatcher.settings(),
        Box::new(TerminalPrompt),
        move || backend.pull(),
    )?;
    if !pulled {
        bail!("pull did not complete");
    }
    println!("Pulled");
    Ok(())
}

/// Pushes to the remote.
///
/// # Errors
///
/// Returns an error if the push fails or authentication fails.
pub fn run_push_command(backend: Arc<dyn Backend>, config: &Config) -> Result<()> {
    let pushed = dispatch(
        config.dispatcher.settings(),
        Box::new(TerminalPrompt),
        move || backend.push(),
    )?;
    if !pushed {
        bail!("push did not complete");
    }
    println!("Pushed");
    Ok(())
}

/// Keeps credentials entered for a repository that does not exist yet.
///
/// A failed clone is rolled back, so the backend that raised the
/// authentication error is gone; the next attempt receives these instead.
#[derive(Debug, Default)]
struct PendingCredentials {
    credentials: Mutex<Option<Credentials>>,
}

impl PendingCredentials {
    fn snapshot(&self) -> Option<Credentials> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialsHandle for PendingCredentials {
    fn current(&self) -> Credentials {
        self.snapshot().unwrap_or_default()
    }

    fn apply(&self, credentials: Credentials) -> VcsResult<()> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        Ok(())
    }
}

/// Creates a repository, populating it from `--from` when given.
///
/// # Errors
///
/// Returns an error if no driver can create the repository, the URL is
/// invalid, or the clone fails.
pub fn run_init_command(args: &InitArgs, config: &Config) -> Result<()> {
    let manager = Arc::new(Mutex::new(build_manager(config)));
    let pending = Arc::new(PendingCredentials::default());
    let vcs = args.vcs.clone();
    let path: PathBuf = args.path.clone();
    let from = args.from.clone();

    let operation = move || -> VcsResult<PathBuf> {
        let mut manager = manager.lock().unwrap_or_else(PoisonError::into_inner);
        match manager.create_with(&vcs, &path, from.as_deref(), pending.snapshot()) {
            Ok(backend) => Ok(backend.repodir().to_path_buf()),
            Err(VcsError::Auth(auth)) => {
                let handle: Arc<dyn CredentialsHandle> = pending.clone();
                Err(VcsError::Auth(Box::new((*auth).with_handle(handle))))
            }
            Err(e) => Err(e),
        }
    };
    let repodir = dispatch(
        config.dispatcher.settings(),
        Box::new(TerminalPrompt),
        operation,
    )?;
    println!("Created {} repository at {}", args.vcs, repodir.display());
    Ok(())
}
