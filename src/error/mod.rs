// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                  VcsError (~24 bytes)
//!                         |
//!   +--------+-------+-------+------+--------+-------+--------+
//!   |        |       |       |      |        |       |        |
//!   v        v       v       v      v        v       v        v
//! Unavail  Feature Property Auth  Invalid   Io   Credential Config
//!   Box      Box     Box     Box  Box<str>  Box     Box      Box
//!                                        Process / NoBackend / Other
//!
//! Every backend-facing variant carries a human `message` and the
//! `raw` stderr of the VCS when one exists.
//!
//! DispatchError (what `on_error` receives)
//!   AuthenticationFailed(AuthError)   prompt cancelled / retries spent
//!   Operation(VcsError)               anything else
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bon::Builder;
use thiserror::Error;

use crate::credentials::{CredentialKey, Credentials, CredentialsHandle};
use crate::feature::{Feature, Property, PropertyOp};

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`VcsError`].
pub type VcsResult<T> = std::result::Result<T, VcsError>;

/// Top-level library error type.
///
/// All payloads are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum VcsError {
    /// A driver cannot serve the directory (missing tool or not a repository).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] Box<BackendUnavailable>),

    /// An operation failed or is not implemented.
    #[error("{0}")]
    Feature(#[from] Box<FeatureError>),

    /// A property accessor failed.
    #[error("{0}")]
    Property(#[from] Box<PropertyError>),

    /// Credentials are missing or wrong.
    #[error("{0}")]
    Auth(#[from] Box<AuthError>),

    /// A precondition on an argument was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(Box<str>),

    /// Filesystem I/O failed.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// A subprocess could not be run.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// The secret storage failed.
    #[error("credential error: {0}")]
    Credential(#[from] Box<CredentialError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// No registered driver accepted the directory.
    #[error("no backend for directory '{0}'")]
    NoBackend(Box<str>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

impl VcsError {
    /// Create a [`VcsError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into().into_boxed_str())
    }

    /// Create a [`VcsError::Other`].
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into().into_boxed_str())
    }

    /// Returns the auth payload if this is an authentication failure.
    #[must_use]
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(auth) => Some(auth),
            _ => None,
        }
    }

    /// Raw VCS output attached to the error, if any.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::BackendUnavailable(e) => e.raw.as_deref(),
            Self::Feature(e) => e.raw.as_deref(),
            Self::Property(e) => e.raw.as_deref(),
            Self::Auth(e) => e.raw.as_deref(),
            _ => None,
        }
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for VcsError {
                fn from(err: $error) -> Self {
                    VcsError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    BackendUnavailable => BackendUnavailable,
    FeatureError => Feature,
    PropertyError => Property,
    AuthError => Auth,
    CredentialError => Credential,
    ConfigError => Config,
    ProcessError => Process,
    std::io::Error => Io,
}

// --- Backend availability ---

/// A driver cannot be used for a directory.
///
/// Never recovered locally: the driver is skipped.
#[derive(Debug, Error, Builder)]
#[error("{driver} cannot serve {directory:?}: {message}")]
pub struct BackendUnavailable {
    #[builder(into)]
    pub directory: PathBuf,
    pub driver: &'static str,
    /// Executables that could not be located.
    #[builder(default)]
    pub programs: Vec<String>,
    /// Libraries that could not be loaded.
    #[builder(default)]
    pub modules: Vec<String>,
    #[builder(default = true)]
    pub is_valid_repository: bool,
    #[builder(into)]
    pub message: String,
    #[builder(into)]
    pub raw: Option<String>,
}

impl BackendUnavailable {
    /// Whether any executable or library is missing.
    #[must_use]
    pub const fn missing_dependencies(&self) -> bool {
        !self.programs.is_empty() || !self.modules.is_empty()
    }
}

// --- Feature errors ---

/// An operation failed; carries the feature handle for introspection.
#[derive(Debug, Clone, Error)]
#[error("{feature} failed: {message}")]
pub struct FeatureError {
    pub feature: Feature,
    pub message: String,
    pub raw: Option<String>,
}

impl FeatureError {
    pub fn new(feature: Feature, message: impl Into<String>) -> Self {
        Self {
            feature,
            message: message.into(),
            raw: None,
        }
    }

    /// Failure for an operation the driver does not provide.
    #[must_use]
    pub fn not_implemented(feature: Feature) -> Self {
        Self::new(feature, "not implemented")
    }

    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

// --- Property errors ---

/// A property accessor failed.
#[derive(Debug, Clone, Error)]
#[error("cannot {operation} property '{name}': {message}")]
pub struct PropertyError {
    pub name: Property,
    pub operation: PropertyOp,
    pub message: String,
    pub raw: Option<String>,
}

impl PropertyError {
    pub fn new(name: Property, operation: PropertyOp, message: impl Into<String>) -> Self {
        Self {
            name,
            operation,
            message: message.into(),
            raw: None,
        }
    }

    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

// --- Authentication errors ---

/// Authentication is required and the known credentials are missing or wrong.
///
/// The optional handle writes replacement credentials back into the backend
/// that raised the error.
#[derive(Clone, Error)]
#[error("authentication failed: {message}")]
pub struct AuthError {
    pub message: String,
    pub raw: Option<String>,
    /// Keys the backend needs, in declaration order.
    pub required: Vec<CredentialKey>,
    /// Credentials known when the failure happened.
    pub credentials: Credentials,
    handle: Option<Arc<dyn CredentialsHandle>>,
}

impl AuthError {
    pub fn new(
        message: impl Into<String>,
        required: Vec<CredentialKey>,
        credentials: Credentials,
    ) -> Self {
        Self {
            message: message.into(),
            raw: None,
            required,
            credentials,
            handle: None,
        }
    }

    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    #[must_use]
    pub fn with_handle(mut self, handle: Arc<dyn CredentialsHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    #[must_use]
    pub fn handle(&self) -> Option<&Arc<dyn CredentialsHandle>> {
        self.handle.as_ref()
    }

    /// Validates `credentials` against [`Self::required`] and writes them
    /// through the handle.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a required key is absent or the error carries no
    /// handle; otherwise whatever the handle reports.
    pub fn set_credentials(&self, credentials: Credentials) -> VcsResult<()> {
        if let Some(missing) = self.required.iter().find(|key| !credentials.contains(**key)) {
            return Err(VcsError::invalid_argument(format!(
                "missing credential key '{missing}'"
            )));
        }
        let handle = self.handle.as_ref().ok_or_else(|| {
            VcsError::invalid_argument("authentication error has no credentials handle")
        })?;
        handle.apply(credentials)
    }
}

impl fmt::Debug for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthError")
            .field("message", &self.message)
            .field("raw", &self.raw)
            .field("required", &self.required)
            .field("credentials", &self.credentials)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

// --- Credential storage errors ---

/// Secret storage errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The OS keyring rejected an operation.
    #[error("keyring failed for service '{service}': {source}")]
    Keyring {
        service: String,
        #[source]
        source: keyring::Error,
    },

    /// The backend has no context to key credentials under.
    #[error("no credential context: {0}")]
    NoContext(String),
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a status outside the accepted set.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Pseudo-terminal setup or I/O failed.
    #[error("terminal error for '{command}': {message}")]
    Terminal { command: String, message: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Dispatcher delivery errors ---

/// Failure delivered to a dispatcher `on_error` callback.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The prompt was cancelled, rejected, or retries ran out.
    #[error("authentication failed: {}", .0.message)]
    AuthenticationFailed(Box<AuthError>),

    /// The operation failed for a non-auth reason.
    #[error(transparent)]
    Operation(#[from] VcsError),
}

#[cfg(test)]
mod tests;
