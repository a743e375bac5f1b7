// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem backend with durable, atomic writes.
//!
//! Every whole-record write goes to a `.tmp` file, is fsynced, and is then
//! renamed over the final path. Snapshot buffers are JSON-lines appended in
//! place; finalize promotes the buffer with a rename so a snapshot either
//! exists completely or not at all. A record that no longer parses is
//! rotated to `.bak` and reported as corrupt instead of being silently
//! dropped.
//!
//! Layout under the root directory:
//!
//! ```text
//! credentials/{user}.bin
//! scans/{scan_id}.json
//! buffers/{scan_id}.jsonl
//! snapshots/{snapshot_id}.jsonl
//! snapshots/{snapshot_id}.meta.json
//! ```

use crate::port::{BatchStore, CredentialStore, RecordIter, ScanStore, SnapshotStore};
use crate::StorageError;
use chrono::Utc;
use ds_core::{
    ActionBatch, BatchId, FileRecord, ScanId, ScanJob, SnapshotId, SnapshotMeta, UserKey,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Filesystem-backed store implementing every port.
pub struct FsStorage {
    root: PathBuf,
    /// Cached record counts for open snapshot buffers.
    buffer_counts: Mutex<HashMap<ScanId, u64>>,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            buffer_counts: Mutex::new(HashMap::new()),
        }
    }

    fn credential_path(&self, user: &UserKey) -> PathBuf {
        self.root
            .join("credentials")
            .join(format!("{}.bin", safe_name(user.as_str())))
    }

    fn scan_path(&self, id: &ScanId) -> PathBuf {
        self.root
            .join("scans")
            .join(format!("{}.json", safe_name(id.as_str())))
    }

    fn buffer_path(&self, id: &ScanId) -> PathBuf {
        self.root
            .join("buffers")
            .join(format!("{}.jsonl", safe_name(id.as_str())))
    }

    fn snapshot_records_path(&self, id: &SnapshotId) -> PathBuf {
        self.root
            .join("snapshots")
            .join(format!("{}.jsonl", safe_name(id.as_str())))
    }

    fn snapshot_meta_path(&self, id: &SnapshotId) -> PathBuf {
        self.root
            .join("snapshots")
            .join(format!("{}.meta.json", safe_name(id.as_str())))
    }

    fn batch_path(&self, id: &BatchId) -> PathBuf {
        self.root
            .join("batches")
            .join(format!("{}.json", safe_name(id.as_str())))
    }

    /// Serialize to a tmp file, fsync, rename over the final path, fsync
    /// the directory so the rename is durable.
    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        write_bytes_atomic(path, &bytes)
    }

    /// Read and parse a whole-record JSON file. A parse failure rotates the
    /// file to `.bak` and reports `Corrupt` so the caller can fail loudly
    /// while the operator keeps the evidence.
    fn read_record<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let bak = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak.display(),
                    "Corrupt record, rotating to .bak",
                );
                fs::rename(path, &bak)?;
                Err(StorageError::Corrupt {
                    key: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn count_buffer_lines(&self, path: &Path) -> Result<u64, StorageError> {
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(reader.lines().count() as u64)
    }
}

impl CredentialStore for FsStorage {
    fn put_sealed_credential(&self, user: &UserKey, blob: &[u8]) -> Result<(), StorageError> {
        write_bytes_atomic(&self.credential_path(user), blob)
    }

    fn get_sealed_credential(&self, user: &UserKey) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.credential_path(user);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn delete_sealed_credential(&self, user: &UserKey) -> Result<(), StorageError> {
        let path = self.credential_path(user);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl ScanStore for FsStorage {
    fn write_scan(&self, job: &ScanJob) -> Result<(), StorageError> {
        self.write_atomic(&self.scan_path(&job.id), job)
    }

    fn read_scan(&self, id: &ScanId) -> Result<Option<ScanJob>, StorageError> {
        self.read_record(&self.scan_path(id))
    }
}

impl SnapshotStore for FsStorage {
    fn buffer_append(
        &self,
        scan_id: &ScanId,
        records: &[FileRecord],
    ) -> Result<u64, StorageError> {
        let path = self.buffer_path(scan_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut counts = self.buffer_counts.lock();
        let count = match counts.get(scan_id) {
            Some(&n) => n,
            None => self.count_buffer_lines(&path)?,
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        let new_count = count + records.len() as u64;
        counts.insert(scan_id.clone(), new_count);
        Ok(new_count)
    }

    fn buffer_truncate(&self, scan_id: &ScanId, offset: u64) -> Result<(), StorageError> {
        let path = self.buffer_path(scan_id);
        if !path.exists() {
            return Ok(());
        }
        let reader = BufReader::new(File::open(&path)?);
        let kept: Vec<String> = reader
            .lines()
            .take(offset as usize)
            .collect::<Result<_, _>>()?;
        let mut bytes = kept.join("\n").into_bytes();
        if !bytes.is_empty() {
            bytes.push(b'\n');
        }
        write_bytes_atomic(&path, &bytes)?;
        self.buffer_counts
            .lock()
            .insert(scan_id.clone(), kept.len() as u64);
        Ok(())
    }

    fn buffer_len(&self, scan_id: &ScanId) -> Result<u64, StorageError> {
        if let Some(&n) = self.buffer_counts.lock().get(scan_id) {
            return Ok(n);
        }
        self.count_buffer_lines(&self.buffer_path(scan_id))
    }

    fn finalize(&self, scan_id: &ScanId, meta: &SnapshotMeta) -> Result<(), StorageError> {
        let buffer = self.buffer_path(scan_id);
        let records = self.snapshot_records_path(&meta.id);
        if let Some(parent) = records.parent() {
            fs::create_dir_all(parent)?;
        }
        if buffer.exists() {
            fs::rename(&buffer, &records)?;
        } else {
            // empty namespace: a snapshot with zero records
            File::create(&records)?.sync_all()?;
        }
        fsync_dir(&records)?;
        self.buffer_counts.lock().remove(scan_id);

        // Meta is written last; a snapshot without meta is unreachable and
        // harmless, meta without records would not be.
        let stamped = FinalizedMeta {
            meta: meta.clone(),
            finalized_at: Utc::now().to_rfc3339(),
        };
        self.write_atomic(&self.snapshot_meta_path(&meta.id), &stamped)
    }

    fn read_meta(&self, id: &SnapshotId) -> Result<Option<SnapshotMeta>, StorageError> {
        Ok(self
            .read_record::<FinalizedMeta>(&self.snapshot_meta_path(id))?
            .map(|stamped| stamped.meta))
    }

    fn read_records(&self, id: &SnapshotId) -> Result<RecordIter, StorageError> {
        let path = self.snapshot_records_path(id);
        if !path.exists() {
            return Ok(Box::new(std::iter::empty()));
        }
        let reader = BufReader::new(File::open(&path)?);
        let iter = reader.lines().map(|line| -> Result<FileRecord, StorageError> {
            let line = line?;
            Ok(serde_json::from_str(&line)?)
        });
        Ok(Box::new(iter))
    }

    fn latest_meta_for_user(&self, user: &UserKey) -> Result<Option<SnapshotMeta>, StorageError> {
        let dir = self.root.join("snapshots");
        if !dir.exists() {
            return Ok(None);
        }
        let mut latest: Option<SnapshotMeta> = None;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_meta = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".meta.json"));
            if !is_meta {
                continue;
            }
            // skip over corrupt metas here; this is a best-effort seed
            let Ok(Some(stamped)) = self.read_record::<FinalizedMeta>(&path) else {
                continue;
            };
            if &stamped.meta.user_key != user {
                continue;
            }
            if latest
                .as_ref()
                .is_none_or(|m| m.taken_at_ms < stamped.meta.taken_at_ms)
            {
                latest = Some(stamped.meta);
            }
        }
        Ok(latest)
    }
}

impl BatchStore for FsStorage {
    fn write_batch(&self, batch: &ActionBatch) -> Result<(), StorageError> {
        self.write_atomic(&self.batch_path(&batch.id), batch)
    }

    fn read_batch(&self, id: &BatchId) -> Result<Option<ActionBatch>, StorageError> {
        self.read_record(&self.batch_path(id))
    }
}

/// Snapshot meta with a human-readable finalize timestamp.
#[derive(serde::Serialize, serde::Deserialize)]
struct FinalizedMeta {
    #[serde(flatten)]
    meta: SnapshotMeta,
    finalized_at: String,
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    fsync_dir(path)?;
    Ok(())
}

fn fsync_dir(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

/// Next available `.bak` path: `x.json.bak`, `x.json.bak.1`, ...
fn rotate_bak_path(path: &Path) -> PathBuf {
    let base = PathBuf::from(format!("{}.bak", path.display()));
    if !base.exists() {
        return base;
    }
    for n in 1.. {
        let candidate = PathBuf::from(format!("{}.bak.{n}", path.display()));
        if !candidate.exists() {
            return candidate;
        }
    }
    base
}

/// Restrict id-derived file names to a safe alphabet.
fn safe_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod fs_tests;
