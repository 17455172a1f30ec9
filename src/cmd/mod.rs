// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   repo     status, stage, commit, log, undo-*
//!   branch   branch, branches, create/delete
//!   remote   fetch, pull, push, init  (through the dispatcher)
//!   config   options, configs, features, version
//! ```

pub mod branch;
pub mod config;
pub mod prompt;
pub mod remote;
pub mod repo;


use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, anyhow};
use tracing::debug;

use crate::backend::Backend;
use crate::backend::git::GitDriver;
use crate::backend::hg::HgDriver;
use crate::config::Config;
use crate::dispatcher::{CredentialPrompt, Dispatcher, DispatcherSettings};
use crate::error::{DispatchError, Result, VcsResult};
use crate::manager::BackendManager;

/// Registers every built-in driver, configured from `config`.
#[must_use]
pub fn build_manager(config: &Config) -> BackendManager {
    let mut manager = BackendManager::new();
    let git = GitDriver::new(config.git_settings(config.secret_storage()));
    manager.register(Arc::new(git));
    manager.register(Arc::new(HgDriver::default()));
    manager
}

/// Opens the repository containing `dir` with the best driver.
///
/// # Errors
///
/// Returns an error if no registered driver accepts the directory.
pub fn open_repository(config: &Config, dir: &Path) -> Result<Arc<dyn Backend>> {
    let mut manager = build_manager(config);
    let backend = manager
        .open(dir)
        .with_context(|| format!("cannot open repository at {}", dir.display()))?
        .ok_or_else(|| anyhow!("no repository directory given"))?;
    debug!(
        driver = backend.driver_name(),
        repodir = %backend.repodir().display(),
        "repository opened"
    );
    Ok(backend)
}

/// Runs `operation` on the dispatcher and blocks until it is delivered.
///
/// Credential prompts triggered by the operation go through `prompt`.
///
/// # Errors
///
/// Returns the operation's error, or an authentication failure once the
/// prompt is cancelled or the retries are exhausted.
pub fn dispatch<T, F>(
    settings: DispatcherSettings,
    prompt: Box<dyn CredentialPrompt>,
    operation: F,
) -> Result<T>
where
    T: Send + 'static,
    F: Fn() -> VcsResult<T> + Send + Sync + 'static,
{
    let mut dispatcher = Dispatcher::new(settings, prompt)?;
    let slot: Arc<Mutex<Option<std::result::Result<T, DispatchError>>>> = Arc::default();
    let on_success = {
        let slot = Arc::clone(&slot);
        move |value: T| {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(value));
        }
    };
    let on_error = {
        let slot = Arc::clone(&slot);
        move |error: DispatchError| {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Err(error));
        }
    };
    dispatcher.invoke(operation, on_success, on_error);
    dispatcher.run_until_idle();

    let outcome = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    match outcome {
        Some(Ok(value)) => Ok(value),
        Some(Err(error)) => Err(error.into()),
        None => Err(anyhow!("operation finished without a result")),
    }
}
