// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::port::{BatchStore, CredentialStore, ScanStore, SnapshotStore};
use ds_core::{
    Capabilities, FakeClock, FileId, MimeCategory, SafetyLevel, ScanConfig, SnapshotMeta,
};

fn record(id: &str) -> FileRecord {
    FileRecord {
        id: FileId::new(id),
        name: format!("{id}.txt"),
        mime: MimeCategory::Document,
        size_bytes: 100,
        modified_at_ms: 0,
        created_at_ms: 0,
        parent_ids: vec![FileId::new("root")],
        shared: false,
        collaborator_count: 0,
        trashed: false,
        checksum: None,
        capabilities: Capabilities::ALL,
    }
}

fn meta(snapshot: &str, scan: &str, user: &str, taken_at: u64) -> SnapshotMeta {
    SnapshotMeta {
        id: SnapshotId::new(snapshot),
        scan_id: ScanId::new(scan),
        user_key: UserKey::new(user),
        taken_at_ms: taken_at,
        total_files: 0,
        total_bytes: 0,
    }
}

#[test]
fn credentials_round_trip_and_delete() {
    let store = MemoryStorage::new();
    let user = UserKey::new("u1");
    assert!(store.get_sealed_credential(&user).unwrap().is_none());

    store.put_sealed_credential(&user, b"sealed").unwrap();
    assert_eq!(store.get_sealed_credential(&user).unwrap().unwrap(), b"sealed");

    store.delete_sealed_credential(&user).unwrap();
    assert!(store.get_sealed_credential(&user).unwrap().is_none());
}

#[test]
fn scan_jobs_round_trip() {
    let store = MemoryStorage::new();
    let clock = FakeClock::at(10);
    let job = ScanJob::new(
        ScanId::new("s1"),
        UserKey::new("u1"),
        ScanConfig::default(),
        &clock,
    );
    store.write_scan(&job).unwrap();
    let back = store.read_scan(&ScanId::new("s1")).unwrap().unwrap();
    assert_eq!(back.id, job.id);
    assert!(store.read_scan(&ScanId::new("other")).unwrap().is_none());
}

#[test]
fn buffer_append_truncate_and_finalize() {
    let store = MemoryStorage::new();
    let scan = ScanId::new("s1");

    assert_eq!(store.buffer_append(&scan, &[record("a"), record("b")]).unwrap(), 2);
    assert_eq!(store.buffer_append(&scan, &[record("c")]).unwrap(), 3);
    assert_eq!(store.buffer_len(&scan).unwrap(), 3);

    // resume path: roll back to the checkpointed offset
    store.buffer_truncate(&scan, 2).unwrap();
    assert_eq!(store.buffer_len(&scan).unwrap(), 2);

    store.finalize(&scan, &meta("snap1", "s1", "u1", 5)).unwrap();
    let records: Vec<_> = store
        .read_records(&SnapshotId::new("snap1"))
        .unwrap()
        .map(|r| r.unwrap().id.to_string())
        .collect();
    assert_eq!(records, vec!["a", "b"]);
    // buffer consumed by finalize
    assert_eq!(store.buffer_len(&scan).unwrap(), 0);
}

#[test]
fn latest_meta_picks_most_recent_for_user() {
    let store = MemoryStorage::new();
    store.finalize(&ScanId::new("s1"), &meta("snap1", "s1", "u1", 10)).unwrap();
    store.finalize(&ScanId::new("s2"), &meta("snap2", "s2", "u1", 20)).unwrap();
    store.finalize(&ScanId::new("s3"), &meta("snap3", "s3", "u2", 99)).unwrap();

    let latest = store.latest_meta_for_user(&UserKey::new("u1")).unwrap().unwrap();
    assert_eq!(latest.id, SnapshotId::new("snap2"));
    assert!(store.latest_meta_for_user(&UserKey::new("nobody")).unwrap().is_none());
}

#[test]
fn batches_round_trip() {
    let store = MemoryStorage::new();
    let clock = FakeClock::at(1);
    let batch = ActionBatch::new(
        BatchId::new("b1"),
        UserKey::new("u1"),
        Vec::new(),
        SafetyLevel::Conservative,
        false,
        5,
        &clock,
    );
    store.write_batch(&batch).unwrap();
    let back = store.read_batch(&BatchId::new("b1")).unwrap().unwrap();
    assert_eq!(back.safety_level, SafetyLevel::Conservative);
}
