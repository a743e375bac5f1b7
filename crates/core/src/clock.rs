// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so time-dependent logic is testable.
//!
//! Token expiry, rollback retention, fresh-auth windows, and recency
//! buckets all read the clock through this trait. Production code uses
//! [`SystemClock`]; tests use [`FakeClock`] and advance it explicitly.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time as epoch milliseconds.
pub trait Clock: Send + Sync {
    fn epoch_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now_ms: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    /// Starts at epoch 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at the given instant.
    pub fn at(epoch_ms: u64) -> Self {
        let clock = Self::default();
        clock.set(epoch_ms);
        clock
    }

    pub fn set(&self, epoch_ms: u64) {
        self.now_ms
            .store(epoch_ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms
            .fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn epoch_ms(&self) -> u64 {
        (**self).epoch_ms()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod clock_tests;
