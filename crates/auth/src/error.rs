// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the credential lifecycle.

use ds_core::{ErrorCode, ErrorReport};
use thiserror::Error;

/// Errors that can occur obtaining or maintaining a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential has ever been stored for the user.
    #[error("no credential for user {0}")]
    Missing(String),
    /// The credential was revoked, by us or by the provider.
    #[error("credential for user {0} is revoked")]
    Revoked(String),
    /// The refresh failed for a reason worth retrying with backoff.
    #[error("transient refresh failure: {0}")]
    RefreshTransient(String),
    /// The provider itself is down.
    #[error("token provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("storage error: {0}")]
    Storage(#[from] ds_storage::StorageError),
    /// Sealed blob failed to unseal or parse.
    #[error("credential record for user {user} is unreadable: {message}")]
    Unreadable { user: String, message: String },
}

impl CredentialError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CredentialError::Missing(_) => ErrorCode::CredentialMissing,
            CredentialError::Revoked(_) => ErrorCode::CredentialRevoked,
            CredentialError::RefreshTransient(_) => ErrorCode::RefreshTransient,
            CredentialError::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            CredentialError::Storage(_) | CredentialError::Unreadable { .. } => {
                ErrorCode::Unavailable
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}
