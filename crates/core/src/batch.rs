// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action batch record: status machine, per-proposal results, and the
//! rollback plan captured during execution.

use crate::clock::Clock;
use crate::error::ErrorReport;
use crate::proposal::{Proposal, SafetyLevel};
use crate::{BatchId, FileId, ProposalId, UserKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an action batch.
///
/// Transitions are monotonic:
/// `draft -> approved -> executing -> (executed | failed) -> (rolled_back | expired)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Approved,
    Executing,
    Executed,
    Failed,
    RolledBack,
    Expired,
}

impl BatchStatus {
    pub fn can_transition(self, to: BatchStatus) -> bool {
        matches!(
            (self, to),
            (BatchStatus::Draft, BatchStatus::Approved)
                | (BatchStatus::Approved, BatchStatus::Executing)
                | (BatchStatus::Executing, BatchStatus::Executed)
                | (BatchStatus::Executing, BatchStatus::Failed)
                | (BatchStatus::Executed, BatchStatus::RolledBack)
                | (BatchStatus::Executed, BatchStatus::Expired)
                | (BatchStatus::Failed, BatchStatus::RolledBack)
                | (BatchStatus::Failed, BatchStatus::Expired)
        )
    }

    /// States in which a rollback plan must exist.
    pub fn has_rollback_plan(self) -> bool {
        matches!(self, BatchStatus::Executed | BatchStatus::Failed)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchStatus::Draft => "draft",
            BatchStatus::Approved => "approved",
            BatchStatus::Executing => "executing",
            BatchStatus::Executed => "executed",
            BatchStatus::Failed => "failed",
            BatchStatus::RolledBack => "rolled_back",
            BatchStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Error raised by an invalid batch status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid batch transition: {from} -> {to}")]
pub struct BatchTransitionError {
    pub from: BatchStatus,
    pub to: BatchStatus,
}

/// Outcome of one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Skipped,
    Failed,
    Cancelled,
}

/// Per-proposal execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub proposal_id: ProposalId,
    pub file_id: FileId,
    pub status: OutcomeStatus,
    /// Preflight warnings that did not block the operation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Skip reason code when status is `skipped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl ExecutionResult {
    pub fn success(proposal_id: ProposalId, file_id: FileId) -> Self {
        Self {
            proposal_id,
            file_id,
            status: OutcomeStatus::Success,
            warnings: Vec::new(),
            skip_reason: None,
            error: None,
        }
    }

    pub fn skipped(proposal_id: ProposalId, file_id: FileId, reason: impl Into<String>) -> Self {
        Self {
            proposal_id,
            file_id,
            status: OutcomeStatus::Skipped,
            warnings: Vec::new(),
            skip_reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn failed(proposal_id: ProposalId, file_id: FileId, error: ErrorReport) -> Self {
        Self {
            proposal_id,
            file_id,
            status: OutcomeStatus::Failed,
            warnings: Vec::new(),
            skip_reason: None,
            error: Some(error),
        }
    }

    pub fn cancelled(proposal_id: ProposalId, file_id: FileId) -> Self {
        Self {
            proposal_id,
            file_id,
            status: OutcomeStatus::Cancelled,
            warnings: Vec::new(),
            skip_reason: None,
            error: None,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Pre-state captured for one successful operation, sufficient to undo it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollbackEntry {
    Move {
        file_id: FileId,
        previous_parents: Vec<FileId>,
    },
    Rename {
        file_id: FileId,
        previous_name: String,
    },
    Trash {
        file_id: FileId,
        previous_parents: Vec<FileId>,
    },
    Archive {
        file_id: FileId,
        previous_parents: Vec<FileId>,
        archive_folder: FileId,
    },
    /// Copy and create_folder both roll back by trashing the created id.
    Created { file_id: FileId },
}

impl RollbackEntry {
    /// The file a restore of this entry touches.
    pub fn file_id(&self) -> &FileId {
        match self {
            RollbackEntry::Move { file_id, .. }
            | RollbackEntry::Rename { file_id, .. }
            | RollbackEntry::Trash { file_id, .. }
            | RollbackEntry::Archive { file_id, .. }
            | RollbackEntry::Created { file_id } => file_id,
        }
    }
}

/// Rollback plan recorded at execution time. Restorable until it expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub entries: Vec<RollbackEntry>,
    pub expires_at_ms: u64,
}

impl RollbackPlan {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Structured log line emitted per restore entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreLog {
    pub file_id: FileId,
    pub op: String,
    pub from: String,
    pub to: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// An ordered collection of proposals with atomic status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionBatch {
    pub id: BatchId,
    pub user_key: UserKey,
    pub proposals: Vec<Proposal>,
    pub status: BatchStatus,
    pub safety_level: SafetyLevel,
    pub continue_on_error: bool,
    pub max_concurrency: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback: Option<RollbackPlan>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at_ms: Option<u64>,
}

impl ActionBatch {
    pub fn new(
        id: BatchId,
        user_key: UserKey,
        proposals: Vec<Proposal>,
        safety_level: SafetyLevel,
        continue_on_error: bool,
        max_concurrency: usize,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            user_key,
            proposals,
            status: BatchStatus::Draft,
            safety_level,
            continue_on_error,
            max_concurrency,
            results: Vec::new(),
            rollback: None,
            created_at_ms: clock.epoch_ms(),
            executed_at_ms: None,
        }
    }

    pub fn transition(&mut self, to: BatchStatus) -> Result<(), BatchTransitionError> {
        if !self.status.can_transition(to) {
            return Err(BatchTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Count of hard failures recorded so far.
    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == OutcomeStatus::Failed)
            .count()
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod batch_tests;
