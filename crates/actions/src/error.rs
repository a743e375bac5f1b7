// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the action engine.

use ds_core::{BatchTransitionError, ErrorCode, ErrorReport};
use ds_engine::RegistryError;
use ds_gateway::GatewayError;
use thiserror::Error;

/// Errors that can occur submitting, executing, or restoring a batch.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("batch not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    State(#[from] BatchTransitionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("storage error: {0}")]
    Storage(#[from] ds_storage::StorageError),
    #[error(transparent)]
    Credential(#[from] ds_auth::CredentialError),
    #[error("invalid batch request: {field}: {message}")]
    Validation { field: String, message: String },
    #[error("rollback plan expired")]
    RestoreExpired,
    #[error("restore requires fresh authentication")]
    FreshAuthRequired,
    #[error("batch has no rollback plan")]
    NoRollbackPlan,
    #[error("batch execution cancelled")]
    Cancelled,
}

impl ActionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ActionError::NotFound(_) => ErrorCode::NotFound,
            ActionError::State(_) | ActionError::NoRollbackPlan => ErrorCode::BatchStateInvalid,
            ActionError::Registry(e) => e.code(),
            ActionError::Gateway(e) => e.code(),
            ActionError::Storage(_) => ErrorCode::Unavailable,
            ActionError::Credential(e) => e.code(),
            ActionError::Validation { .. } => ErrorCode::ValidationFailed,
            ActionError::RestoreExpired => ErrorCode::RestoreExpired,
            ActionError::FreshAuthRequired => ErrorCode::Forbidden,
            ActionError::Cancelled => ErrorCode::Cancelled,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}
