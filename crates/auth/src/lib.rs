// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ds-auth: Per-user OAuth token lifecycle.
//!
//! The [`TokenStore`] owns credential records: obtain on callback, persist
//! sealed, refresh single-flight, revoke. Callers never see refresh tokens;
//! they get short-lived access views via [`TokenStore::with_valid`], which
//! guarantees the token outlives the configured skew window.

mod error;
mod provider;
mod seal;
mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod token;

pub use error::CredentialError;
pub use provider::{TokenGrant, TokenProvider};
pub use seal::{Base64Sealer, Sealer, UnsealError};
pub use store::{AccessView, TokenStore};
pub use token::TokenSet;
