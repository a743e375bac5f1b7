// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for snapshot analysis.

use ds_core::{ErrorCode, ErrorReport};
use thiserror::Error;

/// Errors that can occur during analysis runs.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis cancelled")]
    Cancelled,
    #[error("invalid analysis request: {field}: {message}")]
    Validation { field: String, message: String },
}

impl AnalysisError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::Cancelled => ErrorCode::Cancelled,
            AnalysisError::Validation { .. } => ErrorCode::ValidationFailed,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}
