// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error codes and the user-visible error envelope.
//!
//! Component crates define their own `thiserror` enums; whatever reaches a
//! client is flattened into an [`ErrorReport`] carrying a stable
//! [`ErrorCode`], a human-readable message, and retry guidance. Stack
//! traces and internal detail never cross this boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every stable error code a client can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // -- credential --
    CredentialMissing,
    CredentialRevoked,
    RefreshTransient,
    ProviderUnavailable,
    // -- gateway --
    NotFound,
    Forbidden,
    RateLimited,
    Conflict,
    QuotaExceeded,
    Unavailable,
    CircuitOpen,
    Permanent,
    // -- scan --
    ScanAlreadyActive,
    CheckpointCorrupt,
    DeadlineExceeded,
    Cancelled,
    // -- action --
    PreflightSkipped,
    PartialFailure,
    BatchStateInvalid,
    RestoreExpired,
    DependencyMissing,
    // -- input --
    ValidationFailed,
}

impl ErrorCode {
    /// Whether a caller may retry the same request and expect it to succeed.
    pub fn retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::RefreshTransient
                | ErrorCode::RateLimited
                | ErrorCode::Unavailable
                | ErrorCode::CircuitOpen
                | ErrorCode::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde rename is the single source of the wire spelling
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// The envelope every user-visible failure is reported as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.retryable(),
            retry_after_secs: None,
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorReport {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
