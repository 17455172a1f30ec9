// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Raw `(service, account) -> secret` storage.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::error::{CredentialError, VcsResult};

/// Flat secret storage addressed by service and account.
pub trait SecretStorage: Send + Sync + fmt::Debug {
    /// Returns the secret, or `None` when no entry exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage itself fails.
    fn get(&self, service: &str, account: &str) -> VcsResult<Option<String>>;

    /// Creates or replaces an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage itself fails.
    fn set(&self, service: &str, account: &str, secret: &str) -> VcsResult<()>;

    /// Removes an entry. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage itself fails.
    fn delete(&self, service: &str, account: &str) -> VcsResult<bool>;
}

/// Secret storage backed by the OS keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecrets;

impl KeyringSecrets {
    fn entry(service: &str, account: &str) -> VcsResult<keyring::Entry> {
        keyring::Entry::new(service, account).map_err(|source| {
            CredentialError::Keyring {
                service: service.to_string(),
                source,
            }
            .into()
        })
    }
}

impl SecretStorage for KeyringSecrets {
    fn get(&self, service: &str, account: &str) -> VcsResult<Option<String>> {
        trace!(service, account, "keyring get");
        match Self::entry(service, account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(CredentialError::Keyring {
                service: service.to_string(),
                source,
            }
            .into()),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> VcsResult<()> {
        trace!(service, account, "keyring set");
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(|source| {
                CredentialError::Keyring {
                    service: service.to_string(),
                    source,
                }
                .into()
            })
    }

    fn delete(&self, service: &str, account: &str) -> VcsResult<bool> {
        trace!(service, account, "keyring delete");
        match Self::entry(service, account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(source) => Err(CredentialError::Keyring {
                service: service.to_string(),
                source,
            }
            .into()),
        }
    }
}

/// In-process secret storage.
///
/// Used when `credentials.storage = "memory"` and by tests.
#[derive(Debug, Default)]
pub struct MemorySecrets {
    entries: Mutex<BTreeMap<(String, String), String>>,
}

impl MemorySecrets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStorage for MemorySecrets {
    fn get(&self, service: &str, account: &str) -> VcsResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> VcsResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (service.to_string(), account.to_string()),
                secret.to_string(),
            );
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> VcsResult<bool> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}
