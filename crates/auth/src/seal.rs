// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sealing of token material before it crosses the storage boundary.
//!
//! The storage port only ever sees sealed blobs. Production deployments
//! plug a KMS-backed sealer; [`Base64Sealer`] is the default used in
//! development and tests.

use thiserror::Error;

/// Failure to unseal a blob (wrong key, truncation, tampering).
#[derive(Debug, Clone, Error)]
#[error("unseal failed: {0}")]
pub struct UnsealError(pub String);

/// Envelope encryption boundary for credential blobs.
pub trait Sealer: Send + Sync {
    fn seal(&self, plaintext: &[u8]) -> Vec<u8>;
    fn unseal(&self, sealed: &[u8]) -> Result<Vec<u8>, UnsealError>;
}

/// Encoding-only sealer. Keeps the storage contract honest without
/// requiring key material; not an encryption scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Sealer;

impl Sealer for Base64Sealer {
    fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .encode(plaintext)
            .into_bytes()
    }

    fn unseal(&self, sealed: &[u8]) -> Result<Vec<u8>, UnsealError> {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| UnsealError(e.to_string()))
    }
}
