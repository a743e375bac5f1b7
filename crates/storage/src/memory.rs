// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory backend. Used by tests and by deployments that keep state in
//! an external document store behind their own adapter.

use crate::port::{BatchStore, CredentialStore, RecordIter, ScanStore, SnapshotStore};
use crate::StorageError;
use ds_core::{
    ActionBatch, BatchId, FileRecord, ScanId, ScanJob, SnapshotId, SnapshotMeta, UserKey,
};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    credentials: HashMap<UserKey, Vec<u8>>,
    scans: HashMap<ScanId, ScanJob>,
    buffers: HashMap<ScanId, Vec<FileRecord>>,
    snapshots: HashMap<SnapshotId, (SnapshotMeta, Vec<FileRecord>)>,
    batches: HashMap<BatchId, ActionBatch>,
}

/// Thread-safe in-memory store implementing every port.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStorage {
    fn put_sealed_credential(&self, user: &UserKey, blob: &[u8]) -> Result<(), StorageError> {
        self.inner
            .lock()
            .credentials
            .insert(user.clone(), blob.to_vec());
        Ok(())
    }

    fn get_sealed_credential(&self, user: &UserKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.inner.lock().credentials.get(user).cloned())
    }

    fn delete_sealed_credential(&self, user: &UserKey) -> Result<(), StorageError> {
        self.inner.lock().credentials.remove(user);
        Ok(())
    }
}

impl ScanStore for MemoryStorage {
    fn write_scan(&self, job: &ScanJob) -> Result<(), StorageError> {
        self.inner.lock().scans.insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn read_scan(&self, id: &ScanId) -> Result<Option<ScanJob>, StorageError> {
        Ok(self.inner.lock().scans.get(id).cloned())
    }
}

impl SnapshotStore for MemoryStorage {
    fn buffer_append(
        &self,
        scan_id: &ScanId,
        records: &[FileRecord],
    ) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock();
        let buffer = inner.buffers.entry(scan_id.clone()).or_default();
        buffer.extend_from_slice(records);
        Ok(buffer.len() as u64)
    }

    fn buffer_truncate(&self, scan_id: &ScanId, offset: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if let Some(buffer) = inner.buffers.get_mut(scan_id) {
            buffer.truncate(offset as usize);
        }
        Ok(())
    }

    fn buffer_len(&self, scan_id: &ScanId) -> Result<u64, StorageError> {
        Ok(self
            .inner
            .lock()
            .buffers
            .get(scan_id)
            .map(|b| b.len() as u64)
            .unwrap_or(0))
    }

    fn finalize(&self, scan_id: &ScanId, meta: &SnapshotMeta) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let records = inner.buffers.remove(scan_id).unwrap_or_default();
        inner
            .snapshots
            .insert(meta.id.clone(), (meta.clone(), records));
        Ok(())
    }

    fn read_meta(&self, id: &SnapshotId) -> Result<Option<SnapshotMeta>, StorageError> {
        Ok(self
            .inner
            .lock()
            .snapshots
            .get(id)
            .map(|(meta, _)| meta.clone()))
    }

    fn read_records(&self, id: &SnapshotId) -> Result<RecordIter, StorageError> {
        let records = self
            .inner
            .lock()
            .snapshots
            .get(id)
            .map(|(_, records)| records.clone())
            .unwrap_or_default();
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn latest_meta_for_user(&self, user: &UserKey) -> Result<Option<SnapshotMeta>, StorageError> {
        Ok(self
            .inner
            .lock()
            .snapshots
            .values()
            .filter(|(meta, _)| &meta.user_key == user)
            .max_by_key(|(meta, _)| meta.taken_at_ms)
            .map(|(meta, _)| meta.clone()))
    }
}

impl BatchStore for MemoryStorage {
    fn write_batch(&self, batch: &ActionBatch) -> Result<(), StorageError> {
        self.inner
            .lock()
            .batches
            .insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    fn read_batch(&self, id: &BatchId) -> Result<Option<ActionBatch>, StorageError> {
        Ok(self.inner.lock().batches.get(id).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
