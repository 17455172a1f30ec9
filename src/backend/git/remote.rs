// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Authenticated remote operations and the credential handle.
//!
//! ```text
//! NonInteractive: git <op>  GIT_TERMINAL_PROMPT=0, GIT_ASKPASS=""
//!                   exit 0 => true, else FeatureError
//!
//! Interactive:    PtySession(git <op>) + PromptAuth
//!                   Success => true (update user.name if it changed)
//!                   Denied  => AuthError + GitCredentials handle
//!                   Failed  => FeatureError (transcript as raw)
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::GitBackend;
use super::command::GitRunner;
use crate::backend::Backend;
use crate::core::pty::{AuthOutcome, PromptAuth, PtySession};
use crate::credentials::{
    CredentialKey, Credentials, CredentialsHandle, IdentityKind, KeyringCredentials,
};
use crate::error::{AuthError, CredentialError, FeatureError, VcsError, VcsResult};
use crate::feature::{Method, Operation};

/// How remote operations obtain credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Non-interactive on Windows, interactive elsewhere.
    #[default]
    Auto,
    /// Drive git's prompts through a pseudo-terminal.
    Interactive,
    /// Leave authentication to git's credential helper.
    NonInteractive,
}

impl AuthMode {
    /// Whether this mode drives prompts on the current platform.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        match self {
            Self::Auto => !cfg!(windows),
            Self::Interactive => true,
            Self::NonInteractive => false,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Interactive => "interactive",
            Self::NonInteractive => "non_interactive",
        })
    }
}

/// Remote operations that may need authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Fetch,
    Pull,
    Push,
}

impl RemoteOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }

    const fn method(self) -> Method {
        match self {
            Self::Fetch => Method::Fetch,
            Self::Pull => Method::Pull,
            Self::Push => Method::Push,
        }
    }

    const fn direction(self) -> &'static str {
        match self {
            Self::Push => "to",
            Self::Fetch | Self::Pull => "from",
        }
    }
}

/// Credentials of one Git repository, keyed by its `origin` URL.
#[derive(Debug)]
pub struct GitCredentials {
    runner: GitRunner,
    resolver: KeyringCredentials,
}

impl GitCredentials {
    pub const fn new(runner: GitRunner, resolver: KeyringCredentials) -> Self {
        Self { runner, resolver }
    }

    #[must_use]
    pub const fn resolver(&self) -> &KeyringCredentials {
        &self.resolver
    }

    /// The `origin` URL credentials are stored under.
    ///
    /// # Errors
    ///
    /// `CredentialError::NoContext` when the repository has no `origin`.
    pub fn context(&self) -> VcsResult<String> {
        match self.runner.query(["config", "--get", "remote.origin.url"])? {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(CredentialError::NoContext(format!(
                "{} has no origin remote",
                self.runner.repodir().display()
            ))
            .into()),
        }
    }

    /// Configured `user.name`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot be run.
    pub fn configured_username(&self) -> VcsResult<Option<String>> {
        Ok(self
            .runner
            .query(["config", "user.name"])?
            .filter(|name| !name.is_empty()))
    }

    /// Resolves the stored password for the configured `user.name`.
    ///
    /// Any failure leaves the snapshot empty.
    pub fn preload(&self) {
        let loaded = self.configured_username().and_then(|name| {
            let Some(name) = name else {
                return Ok(());
            };
            let context = self.context()?;
            self.resolver
                .resolve_user(&context, IdentityKind::Username, &name)
                .map(drop)
        });
        if let Err(err) = loaded {
            debug!(
                repodir = %self.runner.repodir().display(),
                error = %err,
                "no preloaded credentials"
            );
        }
    }
}

impl CredentialsHandle for GitCredentials {
    fn current(&self) -> Credentials {
        self.resolver.snapshot()
    }

    fn apply(&self, credentials: Credentials) -> VcsResult<()> {
        let context = self.context()?;
        self.resolver.apply(&context, &credentials)
    }
}

fn compile(pattern: &str) -> VcsResult<Regex> {
    Regex::new(pattern)
        .map_err(|err| VcsError::other(format!("invalid pattern {pattern:?}: {err}")))
}

/// Prompt patterns git prints when asking for HTTP credentials.
///
/// # Errors
///
/// Returns an error only if a pattern fails to compile.
pub fn git_prompts(timeout: std::time::Duration) -> VcsResult<PromptAuth> {
    Ok(PromptAuth::builder()
        .username_prompt(compile(r"Username for .+:")?)
        .password_prompt(compile(r"Password for .+:")?)
        .denied(compile(r"(?i)http basic: access denied")?)
        .timeout(timeout)
        .build())
}

impl GitBackend {
    /// Runs `git <op>` with the configured authentication strategy.
    pub(super) fn remote_operation(&self, op: RemoteOp) -> VcsResult<bool> {
        if self.interactive {
            self.remote_interactive(op)
        } else {
            self.remote_non_interactive(op)
        }
    }

    fn remote_failed(&self, op: RemoteOp, raw: &str) -> VcsError {
        FeatureError::new(
            self.feature(Operation::Method(op.method())),
            format!("Failed to {} {} remote", op.as_str(), op.direction()),
        )
        .with_raw(raw)
        .into()
    }

    fn remote_non_interactive(&self, op: RemoteOp) -> VcsResult<bool> {
        let output = self
            .runner
            .run_with(&self.runner.command([op.as_str()]).env("GIT_ASKPASS", ""))?;
        if output.success() {
            Ok(true)
        } else {
            Err(self.remote_failed(op, output.diagnostic()))
        }
    }

    fn remote_interactive(&self, op: RemoteOp) -> VcsResult<bool> {
        let snapshot = self.credentials.resolver().snapshot();
        let configured = self.credentials.configured_username()?;
        let username = snapshot
            .get(CredentialKey::Username)
            .map(str::to_string)
            .or_else(|| configured.clone())
            .unwrap_or_default();
        let password = snapshot
            .get(CredentialKey::Password)
            .unwrap_or_default()
            .to_string();

        let command = self.runner.prompting_command([op.as_str()]);
        self.runner.ensure_repository()?;
        let mut session = PtySession::spawn(&command)?;
        let outcome = git_prompts(self.auth_timeout)?.drive(&mut session, &username, &password)?;

        match outcome {
            AuthOutcome::Success => {
                if let Some(wanted) = snapshot.get(CredentialKey::Username)
                    && configured.as_deref() != Some(wanted)
                {
                    info!(username = wanted, "updating local user.name");
                    let output = self.runner.run(["config", "--local", "user.name", wanted])?;
                    if !output.success() {
                        warn!(stderr = %output.stderr(), "failed to update user.name");
                    }
                }
                Ok(true)
            }
            AuthOutcome::Denied { transcript } => {
                let credentials = Credentials::default()
                    .with(CredentialKey::Username, Some(username))
                    .with(CredentialKey::Password, Some(password));
                let handle: Arc<dyn CredentialsHandle> = self.credentials.clone();
                Err(AuthError::new(
                    "Wrong credentials",
                    self.credentials.resolver().required().to_vec(),
                    credentials,
                )
                .with_raw(transcript)
                .with_handle(handle)
                .into())
            }
            AuthOutcome::Failed {
                phase,
                reason,
                transcript,
            } => {
                debug!(op = op.as_str(), %phase, %reason, "remote operation failed");
                Err(self.remote_failed(op, &transcript))
            }
        }
    }
}
