// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration, loadable from TOML.
//!
//! Every tunable has a default matching the documented operating values;
//! an empty config file yields a fully working configuration. Section
//! names mirror the component that consumes them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Top-level configuration. All sections optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanSettings,
    pub gateway: GatewaySettings,
    pub dup: DupSettings,
    pub action: ActionSettings,
    pub auth: AuthSettings,
    pub token: TokenSettings,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Clamp/validate cross-field constraints that serde can't express.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_depth > ScanSettings::MAX_DEPTH_CAP {
            return Err(ConfigError::Invalid {
                field: "scan.max_depth".into(),
                message: format!("exceeds cap {}", ScanSettings::MAX_DEPTH_CAP),
            });
        }
        if self.action.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "action.max_concurrency".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.gateway.rps == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.rps".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Scan engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Checkpoint after this many files processed.
    pub checkpoint_every_files: u64,
    /// Checkpoint after this many milliseconds, whichever comes first.
    pub checkpoint_every_ms: u64,
    /// Minimum interval between progress emissions.
    pub progress_emit_ms: u64,
    /// Default traversal depth limit.
    pub max_depth: u32,
    /// Overall scan deadline.
    pub deadline_ms: u64,
}

impl ScanSettings {
    /// Hard cap on the per-scan depth limit.
    pub const MAX_DEPTH_CAP: u32 = 50;
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            checkpoint_every_files: 500,
            checkpoint_every_ms: 5_000,
            progress_emit_ms: 500,
            max_depth: 20,
            deadline_ms: 60 * 60 * 1000,
        }
    }
}

/// Remote gateway tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Per-user requests per second for the token bucket.
    pub rps: u32,
    /// Retry budget for transient failures.
    pub retry_max_attempts: u32,
    /// Exponential backoff base.
    pub retry_base_ms: u64,
    /// Backoff ceiling.
    pub retry_cap_ms: u64,
    /// Consecutive transient failures before the circuit opens.
    pub circuit_failures_to_open: u32,
    /// Window in which consecutive failures must fall to count.
    pub circuit_failure_window_ms: u64,
    /// How long an open circuit rejects calls before a half-open probe.
    pub circuit_cooldown_ms: u64,
    /// Per-call deadline.
    pub call_deadline_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            rps: 10,
            retry_max_attempts: 6,
            retry_base_ms: 200,
            retry_cap_ms: 30_000,
            circuit_failures_to_open: 5,
            circuit_failure_window_ms: 60_000,
            circuit_cooldown_ms: 60_000,
            call_deadline_ms: 30_000,
        }
    }
}

/// Duplicate engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DupSettings {
    /// Files larger than this are never content-hashed.
    pub content_hash_size_cap: u64,
    /// Total bytes the content-hash pass may download per run.
    pub content_hash_aggregate_cap: u64,
    /// Files smaller than this are ignored entirely.
    pub min_file_size: u64,
}

impl Default for DupSettings {
    fn default() -> Self {
        Self {
            content_hash_size_cap: 50 * 1024 * 1024,
            content_hash_aggregate_cap: 2 * 1024 * 1024 * 1024,
            min_file_size: 1,
        }
    }
}

/// Action engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Parallel operations within one dispatch wave.
    pub max_concurrency: usize,
    /// Pause between dispatch waves.
    pub inter_batch_cooldown_ms: u64,
    /// How long a rollback plan stays restorable.
    pub rollback_retention_days: u32,
    /// Max proposals examined by a preview run.
    pub preview_limit: usize,
    /// Overall batch deadline.
    pub deadline_ms: u64,
}

impl ActionSettings {
    /// Hard cap on `max_concurrency`.
    pub const CONCURRENCY_CAP: usize = 10;

    /// Effective concurrency after applying the cap.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.min(Self::CONCURRENCY_CAP).max(1)
    }

    pub fn retention_ms(&self) -> u64 {
        u64::from(self.rollback_retention_days) * 24 * 60 * 60 * 1000
    }
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            inter_batch_cooldown_ms: 1_000,
            rollback_retention_days: 30,
            preview_limit: 10,
            deadline_ms: 30 * 60 * 1000,
        }
    }
}

/// Fresh-auth policy for destructive restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// A credential authenticated within this window counts as fresh.
    pub fresh_window_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            fresh_window_ms: 600_000,
        }
    }
}

/// Token refresh policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Tokens expiring within this window are refreshed before use.
    pub refresh_skew_ms: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            refresh_skew_ms: 60_000,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
