// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full pipeline: scan, analyze, execute, roll back.

use crate::prelude::*;
use ds_actions::{BatchRequest, ExecuteMode, ExecuteOutcome};
use ds_analysis::DetectOptions;
use ds_core::{
    BatchStatus, FileId, MimeCategory, OutcomeStatus, Priority, Proposal, ProposalId,
    ProposalKind, Recommendation, SafetyLevel,
};

#[tokio::test]
async fn organizer_proposals_execute_end_to_end() {
    let world = World::new().await;
    for i in 0..6 {
        let id = format!("pdf-{i}");
        world.drive.add_file("root", &id, &format!("paper {i}.pdf"), 2048);
        let mut record = world.drive.record(&id).unwrap();
        record.mime = MimeCategory::Pdf;
        world.drive.insert(record);
    }

    let meta = world.scan().await;
    let report = world.organizer.analyze(world.snapshot_records(&meta)).await;
    assert!(!report.proposals.is_empty());

    let batch_id = world
        .actions
        .submit(
            &world.ctx(),
            BatchRequest {
                proposals: report.proposals,
                safety_level: SafetyLevel::Normal,
                continue_on_error: true,
                max_concurrency: 5,
            },
        )
        .unwrap();
    let batch = match world
        .actions
        .execute(&world.ctx(), &batch_id, ExecuteMode::Immediate)
        .await
        .unwrap()
    {
        ExecuteOutcome::Executed(batch) => batch,
        other => panic!("expected executed, got {other:?}"),
    };

    assert_eq!(batch.status, BatchStatus::Executed);
    assert!(batch.results.iter().all(|r| r.status == OutcomeStatus::Success));

    // every pdf now lives in the created folder, not the root
    for i in 0..6 {
        let record = world.drive.record(&format!("pdf-{i}")).unwrap();
        assert_ne!(record.parent_ids, vec![FileId::new("root")]);
    }
}

#[tokio::test]
async fn duplicate_recommendation_trashes_then_restores() {
    let world = World::new().await;
    world.drive.add_folder("root", "docs", "Docs");
    world.drive.add_file("docs", "keep", "report.pdf", 1000);
    world.drive.add_file("docs", "dup", "report copy.pdf", 1000);
    for id in ["keep", "dup"] {
        let mut record = world.drive.record(id).unwrap();
        record.checksum = Some("same".into());
        world.drive.insert(record);
    }

    let meta = world.scan().await;
    let report = world
        .duplicates
        .detect(&world.ctx(), world.snapshot_records(&meta), &DetectOptions::default())
        .await
        .unwrap();
    let group = &report.groups[0];
    let delete_ids = match &group.recommendation {
        Recommendation::KeepBest { delete_ids, .. } => delete_ids.clone(),
        other => panic!("expected keep_best, got {other:?}"),
    };
    assert_eq!(delete_ids, vec![FileId::new("dup")]);

    // turn the recommendation into a trash batch
    let proposals: Vec<Proposal> = delete_ids
        .iter()
        .enumerate()
        .map(|(i, file_id)| Proposal {
            id: ProposalId::new(format!("del-{i}")),
            file_id: file_id.clone(),
            kind: ProposalKind::Trash,
            priority: Priority::High,
            safety_flags: Vec::new(),
        })
        .collect();
    let batch_id = world
        .actions
        .submit(
            &world.ctx(),
            BatchRequest {
                proposals,
                safety_level: SafetyLevel::Normal,
                continue_on_error: true,
                max_concurrency: 5,
            },
        )
        .unwrap();
    match world
        .actions
        .execute(&world.ctx(), &batch_id, ExecuteMode::Immediate)
        .await
        .unwrap()
    {
        ExecuteOutcome::Executed(batch) => {
            assert_eq!(batch.status, BatchStatus::Executed)
        }
        other => panic!("expected executed, got {other:?}"),
    }
    assert!(world.drive.record("dup").unwrap().trashed);
    assert!(!world.drive.record("keep").unwrap().trashed);

    // and back
    let logs = world.actions.restore(&world.ctx(), &batch_id, None).await.unwrap();
    assert!(logs.iter().all(|l| l.status == OutcomeStatus::Success));
    let restored = world.drive.record("dup").unwrap();
    assert!(!restored.trashed);
    assert_eq!(restored.parent_ids, vec![FileId::new("docs")]);
}
