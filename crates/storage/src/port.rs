// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage port traits.
//!
//! Each trait covers one namespace of persisted state. Backends implement
//! all of them; consumers depend only on the trait they need.

use crate::StorageError;
use ds_core::{ActionBatch, BatchId, FileRecord, ScanId, ScanJob, SnapshotId, SnapshotMeta, UserKey};

/// Streaming iterator over snapshot records.
pub type RecordIter = Box<dyn Iterator<Item = Result<FileRecord, StorageError>> + Send>;

/// Sealed token material, one blob per user. The blob is opaque here;
/// sealing happens in the token store before this boundary.
pub trait CredentialStore: Send + Sync {
    fn put_sealed_credential(&self, user: &UserKey, blob: &[u8]) -> Result<(), StorageError>;
    fn get_sealed_credential(&self, user: &UserKey) -> Result<Option<Vec<u8>>, StorageError>;
    fn delete_sealed_credential(&self, user: &UserKey) -> Result<(), StorageError>;
}

/// Scan job records, checkpoint included. One record per scan id.
pub trait ScanStore: Send + Sync {
    fn write_scan(&self, job: &ScanJob) -> Result<(), StorageError>;
    fn read_scan(&self, id: &ScanId) -> Result<Option<ScanJob>, StorageError>;
}

/// Snapshot buffers and finalized snapshots.
///
/// While a scan runs, records accumulate in a per-scan buffer. Finalize
/// atomically promotes the buffer into an immutable snapshot; after that
/// the buffer is gone and the snapshot is readable by id.
pub trait SnapshotStore: Send + Sync {
    /// Append records to the scan's buffer. Returns the new record count.
    fn buffer_append(&self, scan_id: &ScanId, records: &[FileRecord])
        -> Result<u64, StorageError>;

    /// Drop buffered records past `offset`. Used on resume so replayed
    /// folders don't duplicate records written after the last checkpoint.
    fn buffer_truncate(&self, scan_id: &ScanId, offset: u64) -> Result<(), StorageError>;

    /// Current record count of the scan's buffer.
    fn buffer_len(&self, scan_id: &ScanId) -> Result<u64, StorageError>;

    /// Atomically promote the buffer into an immutable snapshot.
    fn finalize(&self, scan_id: &ScanId, meta: &SnapshotMeta) -> Result<(), StorageError>;

    fn read_meta(&self, id: &SnapshotId) -> Result<Option<SnapshotMeta>, StorageError>;

    /// Stream the records of a finalized snapshot.
    fn read_records(&self, id: &SnapshotId) -> Result<RecordIter, StorageError>;

    /// Most recent finalized snapshot for a user, if any. Seeds the next
    /// scan's progress estimate.
    fn latest_meta_for_user(&self, user: &UserKey) -> Result<Option<SnapshotMeta>, StorageError>;
}

/// Action batch records. One record per batch id.
pub trait BatchStore: Send + Sync {
    fn write_batch(&self, batch: &ActionBatch) -> Result<(), StorageError>;
    fn read_batch(&self, id: &BatchId) -> Result<Option<ActionBatch>, StorageError>;
}
