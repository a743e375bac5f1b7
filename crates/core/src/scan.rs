// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan job record, status machine, progress, and checkpoint format.

use crate::clock::Clock;
use crate::error::ErrorReport;
use crate::{FileId, ScanId, UserKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a scan job.
///
/// `Queued`, `Running`, and `Paused` are the active states that hold the
/// per-user registry slot. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Cancelled
        )
    }

    /// Active scans block admission of another scan for the same user.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ScanStatus::Queued | ScanStatus::Running | ScanStatus::Paused
        )
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::Queued => "queued",
            ScanStatus::Running => "running",
            ScanStatus::Paused => "paused",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Per-scan traversal options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub max_depth: u32,
    #[serde(default)]
    pub include_trashed: bool,
    #[serde(default)]
    pub include_shared_drives: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            include_trashed: false,
            include_shared_drives: false,
        }
    }
}

/// Counters reported to clients. Monotonic while the scan runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub files_seen: u64,
    pub bytes_seen: u64,
    pub percent: u8,
}

impl ScanProgress {
    /// Merge newer counters, never letting any field move backwards.
    pub fn advance(&mut self, files_seen: u64, bytes_seen: u64, percent: u8) {
        self.files_seen = self.files_seen.max(files_seen);
        self.bytes_seen = self.bytes_seen.max(bytes_seen);
        self.percent = self.percent.max(percent.min(100));
    }

    /// Percent shown while running, capped at 99 until completion.
    pub fn running_percent(files_seen: u64, estimated_total: u64) -> u8 {
        let denominator = files_seen.max(estimated_total).max(1);
        let pct = (100 * files_seen) / denominator;
        (pct as u8).min(99)
    }
}

/// One pending folder in the traversal queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedFolder {
    pub folder_id: FileId,
    pub depth: u32,
}

/// Durable traversal state. Everything needed to continue a scan after a
/// crash or pause: the folder queue, the visited set, how many records the
/// snapshot buffer already holds, and the last emitted progress sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCheckpoint {
    pub queue: Vec<QueuedFolder>,
    pub visited: Vec<FileId>,
    pub buffer_offset: u64,
    pub last_progress_seq: u64,
    pub files_seen: u64,
    pub bytes_seen: u64,
}

/// Error raised by an invalid scan status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scan transition: {from} -> {to}")]
pub struct ScanTransitionError {
    pub from: ScanStatus,
    pub to: ScanStatus,
}

/// The scan job record owned by the scan engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: ScanId,
    pub user_key: UserKey,
    pub status: ScanStatus,
    pub config: ScanConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<ScanCheckpoint>,
    pub progress: ScanProgress,
    pub started_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl ScanJob {
    pub fn new(id: ScanId, user_key: UserKey, config: ScanConfig, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id,
            user_key,
            status: ScanStatus::Queued,
            config,
            checkpoint: None,
            progress: ScanProgress::default(),
            started_at_ms: now,
            updated_at_ms: now,
            finished_at_ms: None,
            error: None,
        }
    }

    /// Apply a status transition, rejecting moves out of a terminal state
    /// and anything else the lifecycle does not allow.
    pub fn transition(&mut self, to: ScanStatus, now_ms: u64) -> Result<(), ScanTransitionError> {
        let allowed = matches!(
            (self.status, to),
            (ScanStatus::Queued, ScanStatus::Running)
                | (ScanStatus::Queued, ScanStatus::Cancelled)
                | (ScanStatus::Running, ScanStatus::Paused)
                | (ScanStatus::Running, ScanStatus::Completed)
                | (ScanStatus::Running, ScanStatus::Failed)
                | (ScanStatus::Running, ScanStatus::Cancelled)
                | (ScanStatus::Paused, ScanStatus::Running)
                | (ScanStatus::Paused, ScanStatus::Failed)
                | (ScanStatus::Paused, ScanStatus::Cancelled)
        );
        if !allowed {
            return Err(ScanTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at_ms = now_ms;
        if to.is_terminal() {
            self.finished_at_ms = Some(now_ms);
        }
        Ok(())
    }

    /// Update progress counters; monotonic while running.
    pub fn record_progress(&mut self, files_seen: u64, bytes_seen: u64, percent: u8, now_ms: u64) {
        self.progress.advance(files_seen, bytes_seen, percent);
        self.updated_at_ms = now_ms;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod scan_tests;
