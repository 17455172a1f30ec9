// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scoped credential store over a [`SecretStorage`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{CredentialKey, SecretStorage};
use crate::error::{VcsError, VcsResult};

/// Identity half of a credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    Username,
    Email,
}

impl IdentityKind {
    #[must_use]
    pub const fn key(self) -> CredentialKey {
        match self {
            Self::Username => CredentialKey::Username,
            Self::Email => CredentialKey::Email,
        }
    }

    /// Identity kind for a credential key, if it is one.
    #[must_use]
    pub const fn from_key(key: CredentialKey) -> Option<Self> {
        match key {
            CredentialKey::Username => Some(Self::Username),
            CredentialKey::Email => Some(Self::Email),
            CredentialKey::Token | CredentialKey::Password => None,
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().as_str())
    }
}

/// Persistent `(context, identity) -> password` pairs and per-context token
/// lists, namespaced by `scope`.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    scope: String,
    secrets: Arc<dyn SecretStorage>,
}

impl CredentialStore {
    pub fn new(scope: impl Into<String>, secrets: Arc<dyn SecretStorage>) -> Self {
        Self {
            scope: scope.into(),
            secrets,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Service name for user/password pairs.
    #[must_use]
    pub fn pair_service(&self, context: &str) -> String {
        format!("{} @ {context}", self.scope)
    }

    /// Service name for the token list.
    #[must_use]
    pub fn token_service(&self, context: &str) -> String {
        format!("{} @ {context} token", self.scope)
    }

    /// Looks up the password stored for an identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret storage fails.
    pub fn get(
        &self,
        context: &str,
        kind: IdentityKind,
        identity: &str,
    ) -> VcsResult<Option<String>> {
        debug!(scope = %self.scope, context, %kind, identity, "credential lookup");
        self.secrets.get(&self.pair_service(context), identity)
    }

    /// Stores the password for an identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret storage fails.
    pub fn set(
        &self,
        context: &str,
        kind: IdentityKind,
        identity: &str,
        password: &str,
    ) -> VcsResult<()> {
        debug!(scope = %self.scope, context, %kind, identity, "credential store");
        self.secrets
            .set(&self.pair_service(context), identity, password)
    }

    /// Removes the password for an identity.
    ///
    /// Best effort: storage failures are logged and swallowed.
    pub fn delete(&self, context: &str, identity: &str) {
        let service = self.pair_service(context);
        if let Err(err) = self.secrets.delete(&service, identity) {
            warn!(service, identity, error = %err, "failed to delete credential");
        }
    }

    /// Number of tokens stored under `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret storage fails.
    pub fn token_count(&self, context: &str) -> VcsResult<usize> {
        let service = self.token_service(context);
        let mut count = 0usize;
        while self.secrets.get(&service, &count.to_string())?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Appends a token to the list under `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or the storage fails.
    pub fn push_token(&self, context: &str, token: &str) -> VcsResult<()> {
        if token.is_empty() {
            return Err(VcsError::invalid_argument("token must not be empty"));
        }
        let index = self.token_count(context)?;
        debug!(scope = %self.scope, context, index, "token push");
        self.secrets
            .set(&self.token_service(context), &index.to_string(), token)
    }

    /// Newest token under `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret storage fails.
    pub fn last_token(&self, context: &str) -> VcsResult<Option<String>> {
        match self.token_count(context)? {
            0 => Ok(None),
            count => self
                .secrets
                .get(&self.token_service(context), &(count - 1).to_string()),
        }
    }

    /// Removes and returns the newest token under `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret storage fails.
    pub fn pop_token(&self, context: &str) -> VcsResult<Option<String>> {
        let count = self.token_count(context)?;
        if count == 0 {
            return Ok(None);
        }
        let service = self.token_service(context);
        let account = (count - 1).to_string();
        let token = self.secrets.get(&service, &account)?;
        self.secrets.delete(&service, &account)?;
        debug!(scope = %self.scope, context, index = count - 1, "token pop");
        Ok(token)
    }
}
