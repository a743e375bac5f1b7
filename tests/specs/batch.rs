// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenarios: shared-file safety policy, restore, retention expiry.

use crate::prelude::*;
use ds_actions::{ActionError, BatchRequest, ExecuteMode, ExecuteOutcome};
use ds_core::{
    BatchStatus, FileId, OutcomeStatus, Priority, Proposal, ProposalId, ProposalKind, SafetyLevel,
};

fn trash(id: &str, file: &str) -> Proposal {
    Proposal {
        id: ProposalId::new(id),
        file_id: FileId::new(file),
        kind: ProposalKind::Trash,
        priority: Priority::Medium,
        safety_flags: Vec::new(),
    }
}

fn request(proposals: Vec<Proposal>, safety: SafetyLevel) -> BatchRequest {
    BatchRequest {
        proposals,
        safety_level: safety,
        continue_on_error: true,
        max_concurrency: 5,
    }
}

async fn execute(world: &World, batch_id: &ds_core::BatchId) -> ds_core::ActionBatch {
    match world
        .actions
        .execute(&world.ctx(), batch_id, ExecuteMode::Immediate)
        .await
        .unwrap()
    {
        ExecuteOutcome::Executed(batch) => batch,
        other => panic!("expected executed, got {other:?}"),
    }
}

fn seed_shared_pair(world: &World) {
    world.drive.add_folder("root", "docs", "Docs");
    world.drive.add_file("docs", "F1", "shared.txt", 10);
    world.drive.add_file("docs", "F2", "private.txt", 10);
    let mut shared = world.drive.record("F1").unwrap();
    shared.shared = true;
    world.drive.insert(shared);
}

#[tokio::test]
async fn shared_file_under_normal_succeeds_with_warning_and_restores() {
    let world = World::new().await;
    seed_shared_pair(&world);

    let batch_id = world
        .actions
        .submit(
            &world.ctx(),
            request(vec![trash("p1", "F1"), trash("p2", "F2")], SafetyLevel::Normal),
        )
        .unwrap();
    let batch = execute(&world, &batch_id).await;

    assert_eq!(batch.status, BatchStatus::Executed);
    assert_eq!(batch.results[0].status, OutcomeStatus::Success);
    assert!(!batch.results[0].warnings.is_empty());
    assert_eq!(batch.results[1].status, OutcomeStatus::Success);
    assert!(batch.results[1].warnings.is_empty());
    // rollback covers both
    assert_eq!(batch.rollback.as_ref().unwrap().entries.len(), 2);

    let logs = world.actions.restore(&world.ctx(), &batch_id, None).await.unwrap();
    assert!(logs.iter().all(|l| l.status == OutcomeStatus::Success));
    for id in ["F1", "F2"] {
        let record = world.drive.record(id).unwrap();
        assert!(!record.trashed);
        assert_eq!(record.parent_ids, vec![FileId::new("docs")]);
    }
}

#[tokio::test]
async fn shared_file_under_conservative_is_skipped() {
    let world = World::new().await;
    seed_shared_pair(&world);

    let batch_id = world
        .actions
        .submit(
            &world.ctx(),
            request(
                vec![trash("p1", "F1"), trash("p2", "F2")],
                SafetyLevel::Conservative,
            ),
        )
        .unwrap();
    let batch = execute(&world, &batch_id).await;

    assert_eq!(batch.results[0].status, OutcomeStatus::Skipped);
    assert_eq!(batch.results[0].skip_reason.as_deref(), Some("shared"));
    assert_eq!(batch.results[1].status, OutcomeStatus::Success);
    // skipped proposals stay out of the rollback plan
    let plan = batch.rollback.unwrap();
    assert_eq!(plan.entries.len(), 1);
    assert_eq!(plan.entries[0].file_id(), &FileId::new("F2"));
    assert!(!world.drive.record("F1").unwrap().trashed);
}

#[tokio::test]
async fn restore_after_retention_expiry_is_refused_without_remote_calls() {
    let world = World::new().await;
    world.drive.add_file("root", "F1", "a.txt", 10);

    let batch_id = world
        .actions
        .submit(&world.ctx(), request(vec![trash("p1", "F1")], SafetyLevel::Normal))
        .unwrap();
    execute(&world, &batch_id).await;

    world.clock.advance(31 * 24 * 60 * 60 * 1000);
    let calls = world.drive.call_count();
    let err = world
        .actions
        .restore(&world.ctx(), &batch_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::RestoreExpired));
    assert_eq!(world.drive.call_count(), calls);
    assert_eq!(
        world.actions.get_status(&batch_id).unwrap().status,
        BatchStatus::Expired
    );
}

#[tokio::test]
async fn double_restore_is_a_no_op() {
    let world = World::new().await;
    world.drive.add_folder("root", "docs", "Docs");
    world.drive.add_file("docs", "F1", "a.txt", 10);

    let batch_id = world
        .actions
        .submit(&world.ctx(), request(vec![trash("p1", "F1")], SafetyLevel::Normal))
        .unwrap();
    execute(&world, &batch_id).await;

    world.actions.restore(&world.ctx(), &batch_id, None).await.unwrap();
    let first = world.drive.record("F1").unwrap();
    let logs = world.actions.restore(&world.ctx(), &batch_id, None).await.unwrap();
    assert!(logs.iter().all(|l| l.status == OutcomeStatus::Success));
    // remote state unchanged by the second restore
    assert_eq!(world.drive.record("F1").unwrap(), first);
}
