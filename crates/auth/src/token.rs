// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted token record.

use serde::{Deserialize, Serialize};

/// Full token material for one user. Only ever handled inside the token
/// store; the refresh token does not leave this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: u64,
    pub granted_scopes: Vec<String>,
    /// When the user last completed an interactive authorization. Refresh
    /// does not move this; the fresh-auth window reads it.
    pub last_authenticated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at_ms: Option<u64>,
}

impl TokenSet {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at_ms.is_some()
    }

    /// Valid means unexpired with `skew_ms` to spare.
    pub fn is_valid_at(&self, now_ms: u64, skew_ms: u64) -> bool {
        !self.is_revoked() && self.expires_at_ms >= now_ms.saturating_add(skew_ms)
    }
}
