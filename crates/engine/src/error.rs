// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scan engine.

use crate::RegistryError;
use ds_core::{ErrorCode, ErrorReport, ScanTransitionError};
use ds_gateway::GatewayError;
use thiserror::Error;

/// Errors that can occur while running a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Transition(#[from] ScanTransitionError),
    #[error("storage error: {0}")]
    Storage(#[from] ds_storage::StorageError),
    #[error("scan not found: {0}")]
    NotFound(String),
    #[error("checkpoint for scan {0} is corrupt")]
    CheckpointCorrupt(String),
    #[error("scan deadline exceeded")]
    DeadlineExceeded,
    #[error("scan cancelled")]
    Cancelled,
    /// Not a failure: the scan parked at a checkpoint on request and can
    /// be resumed with another `run`.
    #[error("scan paused")]
    Paused,
    #[error("invalid scan request: {field}: {message}")]
    Validation { field: String, message: String },
    #[error("scan is in state {0} and cannot run")]
    NotRunnable(String),
}

impl ScanError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ScanError::Registry(e) => e.code(),
            ScanError::Gateway(e) => e.code(),
            ScanError::Transition(_) => ErrorCode::Conflict,
            ScanError::Storage(ds_storage::StorageError::Corrupt { .. }) => {
                ErrorCode::CheckpointCorrupt
            }
            ScanError::Storage(_) => ErrorCode::Unavailable,
            ScanError::NotFound(_) => ErrorCode::NotFound,
            ScanError::CheckpointCorrupt(_) => ErrorCode::CheckpointCorrupt,
            ScanError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            ScanError::Cancelled => ErrorCode::Cancelled,
            ScanError::Paused => ErrorCode::Conflict,
            ScanError::Validation { .. } => ErrorCode::ValidationFailed,
            ScanError::NotRunnable(_) => ErrorCode::Conflict,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}
