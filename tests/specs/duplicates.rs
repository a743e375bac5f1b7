// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenarios: exact duplicates by checksum, version siblings.

use crate::prelude::*;
use ds_analysis::DetectOptions;
use ds_core::{Clock, FileId, MatchKind, Recommendation};

const DAY: u64 = 24 * 60 * 60 * 1000;

#[tokio::test]
async fn exact_duplicates_by_checksum() {
    let world = World::new().await;
    world.drive.add_file("root", "A", "a.dat", 1000);
    world.drive.add_file("root", "A2", "a-prime.dat", 1000);
    world.drive.add_file("root", "B", "b.dat", 500);
    for (id, checksum) in [("A", "x"), ("A2", "x"), ("B", "y")] {
        let mut record = world.drive.record(id).unwrap();
        record.checksum = Some(checksum.into());
        world.drive.insert(record);
    }

    let meta = world.scan().await;
    let report = world
        .duplicates
        .detect(&world.ctx(), world.snapshot_records(&meta), &DetectOptions::default())
        .await
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.match_kind, MatchKind::ExactChecksum);
    let member_ids: Vec<&str> = group.members.iter().map(|m| m.file_id.as_str()).collect();
    assert!(member_ids.contains(&"A") && member_ids.contains(&"A2"));
    assert_eq!(group.space_reclaimable, 1000);

    // keep is the higher quality score
    match &group.recommendation {
        Recommendation::KeepBest { keep_id, delete_ids, .. } => {
            let keep_score = group
                .members
                .iter()
                .find(|m| &m.file_id == keep_id)
                .unwrap()
                .quality_score;
            assert!(group.members.iter().all(|m| m.quality_score <= keep_score));
            assert_eq!(delete_ids.len(), 1);
        }
        other => panic!("expected keep_best, got {other:?}"),
    }
}

#[tokio::test]
async fn version_siblings_with_recency() {
    let world = World::new().await;
    let now = world.clock.epoch_ms();
    world.drive.add_file("root", "orig", "Report.pdf", 500_000);
    world.drive.add_file("root", "dup", "Report (1).pdf", 500_100);
    for (id, modified) in [("orig", now - 2 * DAY), ("dup", now - DAY)] {
        let mut record = world.drive.record(id).unwrap();
        record.modified_at_ms = modified;
        world.drive.insert(record);
    }

    let meta = world.scan().await;
    let report = world
        .duplicates
        .detect(&world.ctx(), world.snapshot_records(&meta), &DetectOptions::default())
        .await
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.match_kind, MatchKind::VersionSibling);
    assert!((75..=85).contains(&group.confidence));
    // the newer file is the keeper for version siblings
    match &group.recommendation {
        Recommendation::KeepBest { keep_id, .. } => {
            assert_eq!(keep_id, &FileId::new("dup"));
        }
        other => panic!("expected keep_best, got {other:?}"),
    }
}
