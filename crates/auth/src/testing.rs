// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canned provider for tests in other crates.

use crate::provider::{TokenGrant, TokenProvider};
use crate::CredentialError;
use async_trait::async_trait;

/// Provider that always succeeds with hour-long tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTokenProvider;

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, CredentialError> {
        Ok(TokenGrant {
            access_token: format!("access-{code}"),
            refresh_token: Some("refresh".into()),
            expires_in_ms: 3_600_000,
            granted_scopes: vec!["drive".into()],
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, CredentialError> {
        self.exchange_code("refreshed").await
    }

    async fn revoke(&self, _refresh_token: &str) -> Result<(), CredentialError> {
        Ok(())
    }
}
