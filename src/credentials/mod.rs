// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Credentials model and persistent secret storage.
//!
//! ```text
//!   Backend ──► KeyringCredentials (resolver, last snapshot)
//!                       │
//!                       ▼
//!               CredentialStore { scope }
//!     "{scope} @ {context}"        account = username/email
//!     "{scope} @ {context} token"  account = "0", "1", ...
//!                       │
//!                       ▼
//!               dyn SecretStorage
//!          KeyringSecrets | MemorySecrets
//! ```

mod resolver;
mod secrets;
mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{VcsError, VcsResult};

pub use resolver::KeyringCredentials;
pub use secrets::{KeyringSecrets, MemorySecrets, SecretStorage};
pub use store::{CredentialStore, IdentityKind};

/// Well-known credential keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKey {
    Username,
    Email,
    Token,
    Password,
}

impl CredentialKey {
    pub const ALL: [Self; 4] = [Self::Username, Self::Email, Self::Token, Self::Password];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Token => "token",
            Self::Password => "password",
        }
    }

    /// Whether the value must not be echoed back to a user.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Token | Self::Password)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKey {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| VcsError::invalid_argument(format!("unknown credential key {s:?}")))
    }
}

/// A credentials mapping.
///
/// A key may be present with a `None` value: "requested but unknown" is
/// distinct from "not requested".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials(BTreeMap<CredentialKey, Option<String>>);

impl Credentials {
    /// A mapping holding exactly `keys`, every value `None`.
    #[must_use]
    pub fn empty_for(keys: &[CredentialKey]) -> Self {
        Self(keys.iter().map(|key| (*key, None)).collect())
    }

    #[must_use]
    pub fn with(mut self, key: CredentialKey, value: Option<impl Into<String>>) -> Self {
        self.insert(key, value.map(Into::into));
        self
    }

    pub fn insert(&mut self, key: CredentialKey, value: Option<String>) {
        self.0.insert(key, value);
    }

    /// Value for `key`; `None` when absent or unknown.
    #[must_use]
    pub fn get(&self, key: CredentialKey) -> Option<&str> {
        self.0.get(&key).and_then(Option::as_deref)
    }

    /// Whether `key` is present, even with a `None` value.
    #[must_use]
    pub fn contains(&self, key: CredentialKey) -> bool {
        self.0.contains_key(&key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = CredentialKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CredentialKey, Option<&str>)> {
        self.0.iter().map(|(key, value)| (*key, value.as_deref()))
    }

    /// Fills keys that are absent or `None` here from `other`.
    pub fn merge_missing(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            let slot = self.0.entry(key).or_insert(None);
            if slot.is_none() {
                *slot = value.map(str::to_string);
            }
        }
    }

    /// A mapping with exactly `keys`; values copied where known.
    #[must_use]
    pub fn restricted_to(&self, keys: &[CredentialKey]) -> Self {
        Self(
            keys.iter()
                .map(|key| (*key, self.get(*key).map(str::to_string)))
                .collect(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            let shown = match value {
                Some(_) if key.is_secret() => Some("***"),
                other => other,
            };
            map.entry(&key.as_str(), &shown);
        }
        map.finish()
    }
}

/// Write-through access to a backend's credentials.
///
/// Carried by [`crate::error::AuthError`] so a caller can refresh the
/// credentials of the backend that failed without holding the backend.
pub trait CredentialsHandle: Send + Sync {
    /// Credentials the backend currently knows.
    fn current(&self) -> Credentials;

    /// Resolves or stores `credentials` and makes them current.
    ///
    /// # Errors
    ///
    /// `AuthError` when a lookup finds nothing; storage errors otherwise.
    fn apply(&self, credentials: Credentials) -> VcsResult<()>;
}
