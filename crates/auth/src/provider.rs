// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External OAuth provider port.

use crate::CredentialError;
use async_trait::async_trait;

/// Token material returned by a successful provider exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    /// Some providers rotate the refresh token on every exchange.
    pub refresh_token: Option<String>,
    pub expires_in_ms: u64,
    pub granted_scopes: Vec<String>,
}

/// The external authorization server.
///
/// Implementations classify provider responses: `invalid_grant` and
/// revocation map to [`CredentialError::Revoked`], 5xx/network to
/// [`CredentialError::RefreshTransient`] or
/// [`CredentialError::ProviderUnavailable`].
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Authorization-code exchange performed on the OAuth callback.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, CredentialError>;

    /// `grant_type=refresh_token` exchange.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, CredentialError>;

    /// Best-effort remote revocation.
    async fn revoke(&self, refresh_token: &str) -> Result<(), CredentialError>;
}
