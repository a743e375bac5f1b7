// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user token bucket sized from configured requests-per-second.

use parking_lot::Mutex;
use tokio::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Classic token bucket: capacity = rps, refill rate = rps per second.
pub struct TokenBucket {
    rps: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(rps: u32) -> Self {
        let rps = f64::from(rps.max(1));
        Self {
            rps,
            state: Mutex::new(BucketState {
                tokens: rps,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token, or report how long to wait until one is available.
    pub fn try_acquire(&self) -> Result<(), std::time::Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rps).min(self.rps);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err(std::time::Duration::from_secs_f64(deficit / self.rps))
        }
    }
}
