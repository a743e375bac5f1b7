// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::FakeClock;
use yare::parameterized;

fn batch(clock: &FakeClock) -> ActionBatch {
    ActionBatch::new(
        BatchId::new("b1"),
        UserKey::new("u1"),
        Vec::new(),
        SafetyLevel::Normal,
        true,
        5,
        clock,
    )
}

#[test]
fn full_lifecycle_to_rolled_back() {
    let clock = FakeClock::at(1);
    let mut batch = batch(&clock);
    batch.transition(BatchStatus::Approved).unwrap();
    batch.transition(BatchStatus::Executing).unwrap();
    batch.transition(BatchStatus::Executed).unwrap();
    batch.transition(BatchStatus::RolledBack).unwrap();
    assert_eq!(batch.status, BatchStatus::RolledBack);
}

#[parameterized(
    draft_to_executing = { BatchStatus::Draft, BatchStatus::Executing },
    draft_to_executed = { BatchStatus::Draft, BatchStatus::Executed },
    approved_to_executed = { BatchStatus::Approved, BatchStatus::Executed },
    executed_to_executing = { BatchStatus::Executed, BatchStatus::Executing },
    rolled_back_anywhere = { BatchStatus::RolledBack, BatchStatus::Approved },
    expired_anywhere = { BatchStatus::Expired, BatchStatus::RolledBack },
    executing_to_draft = { BatchStatus::Executing, BatchStatus::Draft },
)]
fn invalid_transitions_rejected(from: BatchStatus, to: BatchStatus) {
    let clock = FakeClock::new();
    let mut batch = batch(&clock);
    batch.status = from;
    let err = batch.transition(to).unwrap_err();
    assert_eq!(err.from, from);
    assert_eq!(err.to, to);
    // the record is untouched on rejection
    assert_eq!(batch.status, from);
}

#[test]
fn failed_batch_may_still_roll_back() {
    let clock = FakeClock::new();
    let mut batch = batch(&clock);
    batch.status = BatchStatus::Failed;
    batch.transition(BatchStatus::RolledBack).unwrap();
}

#[test]
fn rollback_plan_states() {
    assert!(BatchStatus::Executed.has_rollback_plan());
    assert!(BatchStatus::Failed.has_rollback_plan());
    assert!(!BatchStatus::Draft.has_rollback_plan());
    assert!(!BatchStatus::Executing.has_rollback_plan());
}

#[test]
fn plan_expiry_is_exclusive_of_boundary() {
    let plan = RollbackPlan {
        entries: Vec::new(),
        expires_at_ms: 1_000,
    };
    assert!(!plan.is_expired(1_000));
    assert!(plan.is_expired(1_001));
}

#[test]
fn failure_count_only_counts_failed() {
    let clock = FakeClock::new();
    let mut batch = batch(&clock);
    batch.results = vec![
        ExecutionResult::success(ProposalId::new("p1"), FileId::new("f1")),
        ExecutionResult::skipped(ProposalId::new("p2"), FileId::new("f2"), "shared"),
        ExecutionResult::failed(
            ProposalId::new("p3"),
            FileId::new("f3"),
            crate::ErrorReport::new(crate::ErrorCode::NotFound, "gone"),
        ),
        ExecutionResult::cancelled(ProposalId::new("p4"), FileId::new("f4")),
    ];
    assert_eq!(batch.failure_count(), 1);
}

#[test]
fn rollback_entry_exposes_subject_file() {
    let entry = RollbackEntry::Archive {
        file_id: FileId::new("f9"),
        previous_parents: vec![FileId::new("root")],
        archive_folder: FileId::new("arch"),
    };
    assert_eq!(entry.file_id(), &FileId::new("f9"));
}

#[test]
fn rollback_entry_serde_tags_by_op() {
    let entry = RollbackEntry::Trash {
        file_id: FileId::new("f1"),
        previous_parents: vec![FileId::new("root")],
    };
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["op"], "trash");
}
