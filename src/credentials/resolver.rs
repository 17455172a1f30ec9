// vcal: Version Control Abstraction Layer
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Credential resolution on top of a [`CredentialStore`].
//!
//! Holds the last resolved snapshot so a backend can report which credentials
//! it is currently using.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{CredentialKey, CredentialStore, Credentials, IdentityKind};
use crate::error::{AuthError, VcsError, VcsResult};

/// Resolves and stores credentials for one backend instance.
#[derive(Debug)]
pub struct KeyringCredentials {
    store: CredentialStore,
    required: Vec<CredentialKey>,
    snapshot: Mutex<Credentials>,
}

impl KeyringCredentials {
    pub fn new(store: CredentialStore, required: Vec<CredentialKey>) -> Self {
        Self {
            store,
            required,
            snapshot: Mutex::new(Credentials::default()),
        }
    }

    #[must_use]
    pub fn required(&self) -> &[CredentialKey] {
        &self.required
    }

    #[must_use]
    pub const fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Last resolved credentials, holding exactly the required keys.
    #[must_use]
    pub fn snapshot(&self) -> Credentials {
        self.lock().restricted_to(&self.required)
    }

    /// Forgets the resolved snapshot. The persistent store is untouched.
    pub fn clear(&self) {
        *self.lock() = Credentials::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Credentials> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, credentials: Credentials) {
        *self.lock() = credentials;
    }

    fn not_found(&self, message: String, known: Credentials) -> VcsError {
        AuthError::new(message, self.required.clone(), known.restricted_to(&self.required))
            .into()
    }

    /// Loads the stored password for an identity and makes it current.
    ///
    /// # Errors
    ///
    /// `AuthError` when nothing is stored; storage errors otherwise.
    pub fn resolve_user(
        &self,
        context: &str,
        kind: IdentityKind,
        identity: &str,
    ) -> VcsResult<Credentials> {
        let known = Credentials::default().with(kind.key(), Some(identity));
        let Some(password) = self.store.get(context, kind, identity)? else {
            return Err(self.not_found(
                format!("no stored password for {kind} '{identity}'"),
                known,
            ));
        };
        let resolved = known.with(CredentialKey::Password, Some(password));
        self.remember(resolved.clone());
        Ok(resolved)
    }

    /// Stores a password for an identity and makes it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails.
    pub fn store_user(
        &self,
        context: &str,
        kind: IdentityKind,
        identity: &str,
        password: &str,
    ) -> VcsResult<()> {
        self.store.set(context, kind, identity, password)?;
        self.remember(
            Credentials::default()
                .with(kind.key(), Some(identity))
                .with(CredentialKey::Password, Some(password)),
        );
        Ok(())
    }

    /// Loads the newest token and makes it current.
    ///
    /// # Errors
    ///
    /// `AuthError` when no token is stored; storage errors otherwise.
    pub fn resolve_token(&self, context: &str) -> VcsResult<Credentials> {
        let Some(token) = self.store.last_token(context)? else {
            return Err(self.not_found("no stored token".to_string(), Credentials::default()));
        };
        let resolved = Credentials::default().with(CredentialKey::Token, Some(token));
        self.remember(resolved.clone());
        Ok(resolved)
    }

    /// Appends a token and makes it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or the storage fails.
    pub fn push_token(&self, context: &str, token: &str) -> VcsResult<()> {
        self.store.push_token(context, token)?;
        self.remember(Credentials::default().with(CredentialKey::Token, Some(token)));
        Ok(())
    }

    /// Identity to use from `desired`, following the required key order and
    /// then `username` before `email`.
    fn pick_identity<'a>(&self, desired: &'a Credentials) -> Option<(IdentityKind, &'a str)> {
        self.required
            .iter()
            .copied()
            .chain([CredentialKey::Username, CredentialKey::Email])
            .filter_map(IdentityKind::from_key)
            .find_map(|kind| desired.get(kind.key()).map(|value| (kind, value)))
    }

    /// Reads or writes credentials according to the shape of `desired`.
    ///
    /// ```text
    /// {identity: v, password: p}   store the pair
    /// {identity: v, password: -}   resolve the pair
    /// {token: t}                   push a token
    /// {token: -}                   resolve the newest token
    /// ```
    ///
    /// # Errors
    ///
    /// `AuthError` when a resolve finds nothing; `InvalidArgument` when
    /// `desired` carries neither an identity nor a token.
    pub fn apply(&self, context: &str, desired: &Credentials) -> VcsResult<()> {
        if let Some((kind, identity)) = self.pick_identity(desired) {
            debug!(context, %kind, identity, "apply user credentials");
            return match desired.get(CredentialKey::Password) {
                Some(password) => self.store_user(context, kind, identity, password),
                None => self.resolve_user(context, kind, identity).map(drop),
            };
        }
        if desired.contains(CredentialKey::Token) {
            debug!(context, "apply token credentials");
            return match desired.get(CredentialKey::Token) {
                Some(token) => self.push_token(context, token),
                None => self.resolve_token(context).map(drop),
            };
        }
        Err(VcsError::invalid_argument(
            "credentials need a username, email or token",
        ))
    }
}
