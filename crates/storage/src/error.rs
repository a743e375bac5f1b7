// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for storage backends.

use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The record exists but can no longer be parsed. Filesystem backends
    /// rotate the damaged file to `.bak` before reporting this.
    #[error("corrupt record at {key}: {message}")]
    Corrupt { key: String, message: String },
    /// Writing to a snapshot buffer that was already finalized.
    #[error("snapshot for scan {0} is already finalized")]
    AlreadyFinalized(String),
}
