// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backoff schedule for transient failures.

use ds_core::GatewaySettings;
use rand::Rng;

/// Exponential backoff with jitter: `base * 2^attempt`, ±25%, capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub cap_ms: u64,
}

impl RetryPolicy {
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self {
            max_attempts: settings.retry_max_attempts,
            base_ms: settings.retry_base_ms,
            cap_ms: settings.retry_cap_ms,
        }
    }

    /// Delay before retry number `attempt` (0-based: the delay after the
    /// first failure is `attempt = 0`). A provider-supplied retry-after is
    /// honored as a floor.
    pub fn delay_ms(&self, attempt: u32, retry_after_ms: Option<u64>) -> u64 {
        let exp = self
            .base_ms
            .saturating_mul(1u64 << attempt.min(20))
            .min(self.cap_ms);
        // jitter ±25%
        let jitter_pct: i64 = rand::rng().random_range(-25..=25);
        let jittered = (exp as i64 + exp as i64 * jitter_pct / 100).max(0) as u64;
        let jittered = jittered.min(self.cap_ms);
        match retry_after_ms {
            Some(floor) => jittered.max(floor),
            None => jittered,
        }
    }

    /// Whether another attempt is allowed after `attempts_made` tries.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}
