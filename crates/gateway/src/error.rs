// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured error kinds for remote file operations.

use ds_auth::CredentialError;
use ds_core::{ErrorCode, ErrorReport};
use thiserror::Error;

/// Every result from the gateway carries one of these kinds.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("rate limited")]
    RateLimited {
        /// Provider-supplied retry-after, when the response carried one.
        retry_after_ms: Option<u64>,
    },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// Circuit breaker is open for this user; no network attempt was made.
    #[error("circuit open")]
    CircuitOpen,
    #[error("permanent failure: {0}")]
    Permanent(String),
    #[error("call deadline exceeded")]
    DeadlineExceeded,
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl GatewayError {
    /// Transient failures are retried with backoff and feed the circuit
    /// breaker: 429, 5xx, network timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. }
            | GatewayError::Unavailable(_)
            | GatewayError::DeadlineExceeded => true,
            GatewayError::Credential(e) => matches!(
                e,
                CredentialError::RefreshTransient(_) | CredentialError::ProviderUnavailable(_)
            ),
            _ => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::NotFound(_) => ErrorCode::NotFound,
            GatewayError::Forbidden(_) => ErrorCode::Forbidden,
            GatewayError::RateLimited { .. } => ErrorCode::RateLimited,
            GatewayError::Conflict(_) => ErrorCode::Conflict,
            GatewayError::QuotaExceeded => ErrorCode::QuotaExceeded,
            GatewayError::Unavailable(_) => ErrorCode::Unavailable,
            GatewayError::CircuitOpen => ErrorCode::CircuitOpen,
            GatewayError::Permanent(_) => ErrorCode::Permanent,
            GatewayError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            GatewayError::Cancelled => ErrorCode::Cancelled,
            GatewayError::Credential(e) => e.code(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        let report = ErrorReport::new(self.code(), self.to_string());
        match self {
            GatewayError::RateLimited {
                retry_after_ms: Some(ms),
            } => report.with_retry_after(ms.div_ceil(1000)),
            _ => report,
        }
    }
}
