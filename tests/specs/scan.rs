// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: happy scan over {F1:{F2:{A,B}, C}}.

use crate::prelude::*;
use ds_core::{EventKind, ScanConfig, Topic};
use ds_engine::{RegistryError, ScanError};

#[tokio::test]
async fn happy_scan_counts_files_and_streams_progress() {
    let world = World::new().await;
    world.drive.add_folder("root", "F1", "Projects");
    world.drive.add_folder("F1", "F2", "Reports");
    world.drive.add_file("F2", "A", "a.dat", 1000);
    world.drive.add_file("F2", "B", "b.dat", 2000);
    world.drive.add_file("F1", "C", "c.dat", 3000);

    let ctx = world.ctx();
    let scan_id = world
        .scans
        .start(&ctx, ScanConfig { max_depth: 5, ..Default::default() })
        .unwrap();
    let mut sub = world.bus.subscribe(&Topic::Scan(scan_id.clone()), "spec");
    let meta = world.scans.run(&ctx, &scan_id).await.unwrap();

    assert_eq!(meta.total_files, 3);
    assert_eq!(meta.total_bytes, 6000);

    let events = sub.drain();
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]), "sequences strictly increase");
    let last = events.last().unwrap();
    assert_eq!(last.kind, EventKind::Complete);
    assert_eq!(last.payload["percent"], 100);
}

#[tokio::test]
async fn concurrent_scan_admission_is_refused_until_release() {
    let world = World::new().await;
    world.drive.add_file("root", "A", "a.dat", 1);
    let ctx = world.ctx();
    let first = world.scans.start(&ctx, ScanConfig::default()).unwrap();
    let err = world.scans.start(&ctx, ScanConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Registry(RegistryError::ScanAlreadyActive { .. })
    ));

    world.scans.run(&ctx, &first).await.unwrap();
    world.scans.start(&ctx, ScanConfig::default()).unwrap();
}
