// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ds-gateway: Rate-limited, retrying wrapper around the remote file
//! service.
//!
//! Every outbound operation flows through one pipeline: cancellation
//! check, per-user circuit breaker, per-user token bucket, credential
//! injection, the network attempt under a deadline, then classification
//! of the outcome. Transient failures retry with jittered exponential
//! backoff; permanent ones surface immediately.

mod bucket;
mod circuit;
mod ctx;
mod error;
mod gateway;
mod pages;
mod retry;
mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use bucket::TokenBucket;
pub use circuit::CircuitBreaker;
pub use ctx::Ctx;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use pages::ChildPages;
pub use retry::RetryPolicy;
pub use service::{Page, RemoteFileService};
