// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user circuit breaker over transient failures.
//!
//! Consecutive transient failures inside the failure window open the
//! circuit; while open, calls are rejected without touching the network.
//! After the cooldown one half-open probe is allowed: success closes the
//! circuit, failure re-opens it for another cooldown.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { until_ms: u64 },
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    first_failure_at_ms: u64,
}

/// One breaker instance guards one user's traffic.
pub struct CircuitBreaker {
    failures_to_open: u32,
    failure_window_ms: u64,
    cooldown_ms: u64,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failures_to_open: u32, failure_window_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            failures_to_open,
            failure_window_ms,
            cooldown_ms,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                first_failure_at_ms: 0,
            }),
        }
    }

    /// Whether a call may proceed right now. Transitions Open to HalfOpen
    /// once the cooldown has elapsed, admitting a single probe.
    pub fn allow(&self, now_ms: u64) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed | State::HalfOpen => true,
            State::Open { until_ms } => {
                if now_ms >= until_ms {
                    inner.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut inner = self.inner.lock();
        inner.state = State::Closed;
        inner.consecutive_failures = 0;
    }

    /// Record a transient failure; may open the circuit.
    pub fn on_transient_failure(&self, now_ms: u64) {
        let mut inner = self.inner.lock();
        if inner.state == State::HalfOpen {
            // failed probe: straight back to open
            inner.state = State::Open {
                until_ms: now_ms + self.cooldown_ms,
            };
            inner.consecutive_failures = 0;
            return;
        }

        // restart the streak when the window has lapsed
        if inner.consecutive_failures == 0
            || now_ms.saturating_sub(inner.first_failure_at_ms) > self.failure_window_ms
        {
            inner.consecutive_failures = 0;
            inner.first_failure_at_ms = now_ms;
        }
        inner.consecutive_failures += 1;

        if inner.consecutive_failures >= self.failures_to_open {
            inner.state = State::Open {
                until_ms: now_ms + self.cooldown_ms,
            };
            inner.consecutive_failures = 0;
        }
    }
}
