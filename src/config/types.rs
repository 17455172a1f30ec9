// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config: GlobalConfig, GitConfig, CredentialsConfig, DispatcherConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::git::{AuthMode, DEFAULT_SCOPE};
use crate::dispatcher::{DEFAULT_MAX_AUTH_RETRIES, DEFAULT_WORKERS, DispatcherSettings};
use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Global options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Log file; no file logging when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// Git driver options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Explicit git executable; `PATH` lookup when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
    pub auth_mode: AuthMode,
    /// Per-phase timeout of interactive authentication.
    pub auth_timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: None,
            auth_mode: AuthMode::default(),
            auth_timeout_secs: 10,
        }
    }
}

impl GitConfig {
    #[must_use]
    pub const fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

/// Where secrets are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStorage {
    /// The platform keyring.
    #[default]
    Keyring,
    /// Process memory; nothing survives exit.
    Memory,
}

impl std::fmt::Display for CredentialStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for CredentialStorage {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                section: "credentials".to_string(),
                key: "storage".to_string(),
                message: format!("expected 'keyring' or 'memory', got '{s}'"),
            }),
        }
    }
}

/// Credential storage options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub storage: CredentialStorage,
    /// Keyring service prefix.
    pub scope: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            storage: CredentialStorage::default(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

/// Worker pool options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Worker threads, at least one.
    pub workers: usize,
    /// Credential prompts per invocation before giving up.
    pub max_auth_retries: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_auth_retries: DEFAULT_MAX_AUTH_RETRIES,
        }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub fn settings(&self) -> DispatcherSettings {
        DispatcherSettings::builder()
            .workers(self.workers)
            .max_auth_retries(self.max_auth_retries)
            .build()
    }
}
