// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for vcal.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. vcal.toml (cwd, optional)
//! 3. --config FILE (repeatable)
//! 4. VCAL_* env vars
//! 5. --set key=value
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! VCAL_GIT__AUTH_MODE=interactive    → git.auth_mode = "interactive"
//! VCAL_DISPATCHER__WORKERS=4         → dispatcher.workers = 4
//! VCAL_CREDENTIALS__STORAGE=memory   → credentials.storage = "memory"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::backend::git::GitSettings;
use crate::credentials::{KeyringSecrets, MemorySecrets, SecretStorage};
use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{CredentialStorage, CredentialsConfig, DispatcherConfig, GitConfig, GlobalConfig};

/// Local configuration file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "vcal.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "VCAL";

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub global: GlobalConfig,
    pub git: GitConfig,
    pub credentials: CredentialsConfig,
    pub dispatcher: DispatcherConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use vcal::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("vcal.toml")
    ///     .with_env_prefix("VCAL")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |section: &str, key: &str, message: &str| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.dispatcher.workers == 0 {
            return Err(invalid("dispatcher", "workers", "must be at least 1"));
        }
        if self.git.auth_timeout_secs == 0 {
            return Err(invalid("git", "auth_timeout_secs", "must be at least 1"));
        }
        if self.credentials.scope.trim().is_empty() {
            return Err(invalid("credentials", "scope", "must not be empty"));
        }
        Ok(())
    }

    /// Secret storage selected by `credentials.storage`.
    #[must_use]
    pub fn secret_storage(&self) -> Arc<dyn SecretStorage> {
        match self.credentials.storage {
            CredentialStorage::Keyring => Arc::new(KeyringSecrets),
            CredentialStorage::Memory => Arc::new(MemorySecrets::new()),
        }
    }

    /// Git driver settings backed by `secrets`.
    #[must_use]
    pub fn git_settings(&self, secrets: Arc<dyn SecretStorage>) -> GitSettings {
        GitSettings::builder()
            .maybe_program(self.git.program.clone())
            .auth_mode(self.git.auth_mode)
            .auth_timeout(self.git.auth_timeout())
            .secrets(secrets)
            .scope(self.credentials.scope.clone())
            .build()
    }

    /// Format configuration options for display.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_git_options(&mut options);
        self.format_credentials_options(&mut options);
        self.format_dispatcher_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        if let Some(log_file) = &self.global.log_file {
            options.insert("global.log_file".into(), log_file.display().to_string());
        }
    }

    fn format_git_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "git.program".into(),
            self.git
                .program
                .as_ref()
                .map_or_else(|| "<PATH>".to_string(), |p| p.display().to_string()),
        );
        options.insert("git.auth_mode".into(), self.git.auth_mode.to_string());
        options.insert(
            "git.auth_timeout_secs".into(),
            self.git.auth_timeout_secs.to_string(),
        );
    }

    fn format_credentials_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "credentials.storage".into(),
            self.credentials.storage.to_string(),
        );
        options.insert("credentials.scope".into(), self.credentials.scope.clone());
    }

    fn format_dispatcher_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "dispatcher.workers".into(),
            self.dispatcher.workers.to_string(),
        );
        options.insert(
            "dispatcher.max_auth_retries".into(),
            self.dispatcher.max_auth_retries.to_string(),
        );
    }
}
