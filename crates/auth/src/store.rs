// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The token store.
//!
//! Refresh is single-flight per user: concurrent callers hitting an
//! expired token share one provider exchange. The guard is a per-user
//! async mutex; after acquisition the record is re-read so waiters reuse
//! the winner's token instead of refreshing again.

use crate::provider::{TokenGrant, TokenProvider};
use crate::seal::Sealer;
use crate::token::TokenSet;
use crate::CredentialError;
use ds_core::{Clock, UserKey};
use ds_storage::CredentialStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What callers are allowed to see. No refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessView {
    pub access_token: String,
    pub expires_at_ms: u64,
    pub granted_scopes: Vec<String>,
    pub last_authenticated_at_ms: u64,
}

impl AccessView {
    fn of(tokens: &TokenSet) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            expires_at_ms: tokens.expires_at_ms,
            granted_scopes: tokens.granted_scopes.clone(),
            last_authenticated_at_ms: tokens.last_authenticated_at_ms,
        }
    }
}

/// Per-user OAuth credential lifecycle.
pub struct TokenStore {
    storage: Arc<dyn CredentialStore>,
    provider: Arc<dyn TokenProvider>,
    sealer: Arc<dyn Sealer>,
    clock: Arc<dyn Clock>,
    skew_ms: u64,
    refresh_guards: Mutex<HashMap<UserKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenStore {
    pub fn new(
        storage: Arc<dyn CredentialStore>,
        provider: Arc<dyn TokenProvider>,
        sealer: Arc<dyn Sealer>,
        clock: Arc<dyn Clock>,
        refresh_skew_ms: u64,
    ) -> Self {
        Self {
            storage,
            provider,
            sealer,
            clock,
            skew_ms: refresh_skew_ms,
            refresh_guards: Mutex::new(HashMap::new()),
        }
    }

    /// OAuth-callback path: exchange the authorization code and persist the
    /// resulting credential. Sets the interactive-auth timestamp.
    pub async fn obtain(&self, user: &UserKey, code: &str) -> Result<AccessView, CredentialError> {
        let grant = self.provider.exchange_code(code).await?;
        let now = self.clock.epoch_ms();
        let refresh_token = grant.refresh_token.clone().unwrap_or_default();
        let tokens = TokenSet {
            access_token: grant.access_token,
            refresh_token,
            expires_at_ms: now.saturating_add(grant.expires_in_ms),
            granted_scopes: grant.granted_scopes,
            last_authenticated_at_ms: now,
            revoked_at_ms: None,
        };
        self.persist(user, &tokens)?;
        info!(user_key = %user, "credential stored");
        Ok(AccessView::of(&tokens))
    }

    /// Persist a complete token set. Replaces any previous record, which
    /// keeps the one-non-revoked-record-per-user invariant trivially true.
    pub fn put(&self, user: &UserKey, tokens: &TokenSet) -> Result<(), CredentialError> {
        self.persist(user, tokens)
    }

    /// Current access view, or `None` when no credential exists. A revoked
    /// record reports `CredentialRevoked` rather than pretending absence.
    pub fn get(&self, user: &UserKey) -> Result<Option<AccessView>, CredentialError> {
        match self.load(user)? {
            None => Ok(None),
            Some(tokens) if tokens.is_revoked() => {
                Err(CredentialError::Revoked(user.to_string()))
            }
            Some(tokens) => Ok(Some(AccessView::of(&tokens))),
        }
    }

    /// When the user last completed interactive authorization.
    pub fn last_authenticated_at_ms(&self, user: &UserKey) -> Result<u64, CredentialError> {
        let tokens = self.load_required(user)?;
        if tokens.is_revoked() {
            return Err(CredentialError::Revoked(user.to_string()));
        }
        Ok(tokens.last_authenticated_at_ms)
    }

    /// Force a refresh now, single-flight with any concurrent callers.
    pub async fn refresh(&self, user: &UserKey) -> Result<AccessView, CredentialError> {
        let guard = self.guard_for(user);
        let _flight = guard.lock().await;
        let tokens = self.load_required(user)?;
        if tokens.is_revoked() {
            return Err(CredentialError::Revoked(user.to_string()));
        }
        self.refresh_locked(user, tokens).await
    }

    /// Revoke the credential: best-effort remote revocation, then mark the
    /// record. Later calls observe `CredentialRevoked`.
    pub async fn revoke(&self, user: &UserKey) -> Result<(), CredentialError> {
        let Some(mut tokens) = self.load(user)? else {
            return Err(CredentialError::Missing(user.to_string()));
        };
        if tokens.is_revoked() {
            return Ok(());
        }
        if let Err(e) = self.provider.revoke(&tokens.refresh_token).await {
            warn!(user_key = %user, error = %e, "remote revocation failed, marking locally");
        }
        tokens.revoked_at_ms = Some(self.clock.epoch_ms());
        self.persist(user, &tokens)?;
        info!(user_key = %user, "credential revoked");
        Ok(())
    }

    /// Run `f` with an access token guaranteed valid for at least the skew
    /// window, refreshing once if necessary.
    pub async fn with_valid<T, F, Fut>(&self, user: &UserKey, f: F) -> Result<T, CredentialError>
    where
        F: FnOnce(AccessView) -> Fut,
        Fut: Future<Output = T>,
    {
        let view = self.valid_view(user).await?;
        Ok(f(view).await)
    }

    async fn valid_view(&self, user: &UserKey) -> Result<AccessView, CredentialError> {
        let tokens = self.load_required(user)?;
        if tokens.is_revoked() {
            return Err(CredentialError::Revoked(user.to_string()));
        }
        if tokens.is_valid_at(self.clock.epoch_ms(), self.skew_ms) {
            return Ok(AccessView::of(&tokens));
        }

        let guard = self.guard_for(user);
        let _flight = guard.lock().await;
        // Re-check under the guard: a concurrent caller may have finished
        // the refresh while we waited.
        let tokens = self.load_required(user)?;
        if tokens.is_revoked() {
            return Err(CredentialError::Revoked(user.to_string()));
        }
        if tokens.is_valid_at(self.clock.epoch_ms(), self.skew_ms) {
            return Ok(AccessView::of(&tokens));
        }
        self.refresh_locked(user, tokens).await
    }

    /// Perform the provider exchange. Caller holds the user's guard.
    async fn refresh_locked(
        &self,
        user: &UserKey,
        mut tokens: TokenSet,
    ) -> Result<AccessView, CredentialError> {
        debug!(user_key = %user, "refreshing access token");
        let grant = match self.provider.refresh(&tokens.refresh_token).await {
            Ok(grant) => grant,
            Err(CredentialError::Revoked(_)) => {
                // invalid_grant: the provider no longer honors this family
                tokens.revoked_at_ms = Some(self.clock.epoch_ms());
                self.persist(user, &tokens)?;
                warn!(user_key = %user, "refresh rejected, credential marked revoked");
                return Err(CredentialError::Revoked(user.to_string()));
            }
            Err(e) => return Err(e),
        };

        let now = self.clock.epoch_ms();
        tokens.access_token = grant.access_token;
        tokens.expires_at_ms = now.saturating_add(grant.expires_in_ms);
        if let Some(rotated) = grant.refresh_token {
            tokens.refresh_token = rotated;
        }
        if !grant.granted_scopes.is_empty() {
            tokens.granted_scopes = grant.granted_scopes;
        }
        self.persist(user, &tokens)?;
        Ok(AccessView::of(&tokens))
    }

    fn guard_for(&self, user: &UserKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.refresh_guards.lock();
        guards.entry(user.clone()).or_default().clone()
    }

    fn load(&self, user: &UserKey) -> Result<Option<TokenSet>, CredentialError> {
        let Some(blob) = self.storage.get_sealed_credential(user)? else {
            return Ok(None);
        };
        let plain = self
            .sealer
            .unseal(&blob)
            .map_err(|e| CredentialError::Unreadable {
                user: user.to_string(),
                message: e.to_string(),
            })?;
        let tokens =
            serde_json::from_slice(&plain).map_err(|e| CredentialError::Unreadable {
                user: user.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(tokens))
    }

    fn load_required(&self, user: &UserKey) -> Result<TokenSet, CredentialError> {
        self.load(user)?
            .ok_or_else(|| CredentialError::Missing(user.to_string()))
    }

    fn persist(&self, user: &UserKey, tokens: &TokenSet) -> Result<(), CredentialError> {
        let plain = serde_json::to_vec(tokens).map_err(|e| CredentialError::Unreadable {
            user: user.to_string(),
            message: e.to_string(),
        })?;
        let sealed = self.sealer.seal(&plain);
        self.storage.put_sealed_credential(user, &sealed)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
