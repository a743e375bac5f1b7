// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem persistence: state written by one engine instance is
//! readable by a fresh one, as after a process restart.

use ds_auth::testing::StaticTokenProvider;
use ds_auth::{Base64Sealer, TokenStore};
use ds_core::{FakeClock, GatewaySettings, ScanConfig, ScanSettings, SeqIdGen, UserKey};
use ds_engine::{EventBus, JobRegistry, ScanEngine};
use ds_gateway::testing::FakeDrive;
use ds_gateway::{Ctx, Gateway};
use ds_storage::{FsStorage, ScanStore, SnapshotStore};
use std::sync::Arc;
use tempfile::tempdir;

fn engine(
    drive: Arc<FakeDrive>,
    storage: Arc<FsStorage>,
    tokens: Arc<TokenStore>,
    clock: &FakeClock,
) -> ScanEngine<SeqIdGen> {
    let gateway = Arc::new(Gateway::new(
        drive,
        tokens,
        Arc::new(clock.clone()),
        GatewaySettings::default(),
    ));
    ScanEngine::new(
        gateway,
        storage.clone(),
        storage,
        Arc::new(JobRegistry::new()),
        Arc::new(EventBus::default()),
        Arc::new(clock.clone()),
        SeqIdGen::new("scan"),
        ScanSettings::default(),
    )
}

#[tokio::test]
async fn snapshot_and_job_survive_an_engine_restart() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::at(1_000_000);
    let drive = Arc::new(FakeDrive::default());
    drive.add_folder("root", "F1", "Projects");
    drive.add_file("F1", "A", "a.dat", 123);
    drive.add_file("root", "B", "b.dat", 77);

    let tokens = {
        let storage = Arc::new(FsStorage::new(dir.path()));
        Arc::new(TokenStore::new(
            storage,
            Arc::new(StaticTokenProvider),
            Arc::new(Base64Sealer),
            Arc::new(clock.clone()),
            60_000,
        ))
    };
    tokens.obtain(&UserKey::new("u1"), "seed").await.unwrap();

    let ctx = Ctx::new(UserKey::new("u1"));
    let meta = {
        let storage = Arc::new(FsStorage::new(dir.path()));
        let scans = engine(drive.clone(), storage, tokens.clone(), &clock);
        let scan_id = scans.start(&ctx, ScanConfig::default()).unwrap();
        scans.run(&ctx, &scan_id).await.unwrap()
    };
    assert_eq!(meta.total_files, 2);
    assert_eq!(meta.total_bytes, 200);

    // a fresh storage instance over the same directory sees everything
    let reopened = FsStorage::new(dir.path());
    let job = reopened.read_scan(&meta.scan_id).unwrap().unwrap();
    assert!(job.is_terminal());
    let records = reopened.read_records(&meta.id).unwrap().count();
    assert_eq!(records, 3); // two files plus the folder

    let latest = reopened
        .latest_meta_for_user(&UserKey::new("u1"))
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, meta.id);
}
