// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fake of the remote file service for tests in other crates.
//!
//! Holds a mutable namespace tree, serves paged listings, applies
//! mutations the way the real service would, and can be scripted to fail
//! specific operations.

use crate::service::{Page, RemoteFileService};
use crate::GatewayError;
use async_trait::async_trait;
use ds_core::{Capabilities, FileId, FileRecord, MimeCategory};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// The synthetic root folder id the scan engine seeds from.
pub const ROOT: &str = "root";

struct DriveState {
    files: HashMap<FileId, FileRecord>,
    contents: HashMap<FileId, Vec<u8>>,
}

/// Scriptable in-memory drive.
pub struct FakeDrive {
    state: Mutex<DriveState>,
    failures: Mutex<VecDeque<(&'static str, GatewayError)>>,
    next_id: AtomicU64,
    calls: AtomicU32,
    downloaded_bytes: AtomicU64,
    page_size: usize,
}

impl Default for FakeDrive {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FakeDrive {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Mutex::new(DriveState {
                files: HashMap::new(),
                contents: HashMap::new(),
            }),
            failures: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            calls: AtomicU32::new(0),
            downloaded_bytes: AtomicU64::new(0),
            page_size: page_size.max(1),
        }
    }

    /// Insert a folder under `parent` and return its id.
    pub fn add_folder(&self, parent: &str, id: &str, name: &str) -> FileId {
        let record = FileRecord {
            id: FileId::new(id),
            name: name.to_string(),
            mime: MimeCategory::Folder,
            size_bytes: 0,
            modified_at_ms: 0,
            created_at_ms: 0,
            parent_ids: vec![FileId::new(parent)],
            shared: false,
            collaborator_count: 0,
            trashed: false,
            checksum: None,
            capabilities: Capabilities::ALL,
        };
        self.insert(record.clone());
        record.id
    }

    /// Insert a plain file; returns its id.
    pub fn add_file(&self, parent: &str, id: &str, name: &str, size: u64) -> FileId {
        let record = FileRecord {
            id: FileId::new(id),
            name: name.to_string(),
            mime: MimeCategory::Document,
            size_bytes: size,
            modified_at_ms: 0,
            created_at_ms: 0,
            parent_ids: vec![FileId::new(parent)],
            shared: false,
            collaborator_count: 0,
            trashed: false,
            checksum: None,
            capabilities: Capabilities::ALL,
        };
        self.insert(record.clone());
        record.id
    }

    /// Insert a fully specified record.
    pub fn insert(&self, record: FileRecord) {
        let mut state = self.state.lock();
        state.files.insert(record.id.clone(), record);
    }

    /// Attach downloadable bytes to a file.
    pub fn set_content(&self, id: &str, bytes: Vec<u8>) {
        self.state.lock().contents.insert(FileId::new(id), bytes);
    }

    /// Script the next call of `op` to fail.
    pub fn fail_next(&self, op: &'static str, error: GatewayError) {
        self.failures.lock().push_back((op, error));
    }

    pub fn record(&self, id: &str) -> Option<FileRecord> {
        self.state.lock().files.get(&FileId::new(id)).cloned()
    }

    /// Hard-delete a record, as if the user removed it out of band.
    pub fn remove(&self, id: &str) {
        self.state.lock().files.remove(&FileId::new(id));
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes.load(Ordering::SeqCst)
    }

    fn check_failure(&self, op: &'static str) -> Result<(), GatewayError> {
        let mut failures = self.failures.lock();
        if let Some(position) = failures.iter().position(|(o, _)| *o == op) {
            let (_, error) = failures
                .remove(position)
                .unwrap_or((op, GatewayError::Permanent("script".into())));
            return Err(error);
        }
        Ok(())
    }

    fn bump(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn fresh_id(&self, prefix: &str) -> FileId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        FileId::new(format!("{prefix}-{n}"))
    }
}

#[async_trait]
impl RemoteFileService for FakeDrive {
    async fn list_children(
        &self,
        _token: &str,
        folder_id: &FileId,
        cursor: Option<&str>,
    ) -> Result<Page, GatewayError> {
        self.bump();
        self.check_failure("list_children")?;
        let state = self.state.lock();
        let mut children: Vec<FileRecord> = state
            .files
            .values()
            .filter(|f| f.parent_ids.contains(folder_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));

        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(children.len());
        let next_cursor = if end < children.len() {
            Some(end.to_string())
        } else {
            None
        };
        Ok(Page {
            records: children[start..end].to_vec(),
            next_cursor,
        })
    }

    async fn get_file(&self, _token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("get_file")?;
        self.state
            .lock()
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))
    }

    async fn create_folder(
        &self,
        _token: &str,
        parent_id: &FileId,
        name: &str,
    ) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("create_folder")?;
        let record = FileRecord {
            id: self.fresh_id("folder"),
            name: name.to_string(),
            mime: MimeCategory::Folder,
            size_bytes: 0,
            modified_at_ms: 0,
            created_at_ms: 0,
            parent_ids: vec![parent_id.clone()],
            shared: false,
            collaborator_count: 0,
            trashed: false,
            checksum: None,
            capabilities: Capabilities::ALL,
        };
        self.state
            .lock()
            .files
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn move_file(
        &self,
        _token: &str,
        file_id: &FileId,
        add_parents: &[FileId],
        remove_parents: &[FileId],
    ) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("move_file")?;
        let mut state = self.state.lock();
        let record = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        record.parent_ids.retain(|p| !remove_parents.contains(p));
        for parent in add_parents {
            if !record.parent_ids.contains(parent) {
                record.parent_ids.push(parent.clone());
            }
        }
        Ok(record.clone())
    }

    async fn rename(
        &self,
        _token: &str,
        file_id: &FileId,
        new_name: &str,
    ) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("rename")?;
        let mut state = self.state.lock();
        let record = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        record.name = new_name.to_string();
        Ok(record.clone())
    }

    async fn trash(&self, _token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("trash")?;
        let mut state = self.state.lock();
        let record = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        record.trashed = true;
        Ok(record.clone())
    }

    async fn untrash(&self, _token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("untrash")?;
        let mut state = self.state.lock();
        let record = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        record.trashed = false;
        Ok(record.clone())
    }

    async fn copy(
        &self,
        _token: &str,
        file_id: &FileId,
        parent_id: &FileId,
        new_name: Option<&str>,
    ) -> Result<FileRecord, GatewayError> {
        self.bump();
        self.check_failure("copy")?;
        let mut state = self.state.lock();
        let source = state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        let mut copy = source;
        copy.id = self.fresh_id("copy");
        copy.parent_ids = vec![parent_id.clone()];
        if let Some(name) = new_name {
            copy.name = name.to_string();
        }
        state.files.insert(copy.id.clone(), copy.clone());
        Ok(copy)
    }

    async fn download(
        &self,
        _token: &str,
        file_id: &FileId,
        byte_limit: u64,
    ) -> Result<Vec<u8>, GatewayError> {
        self.bump();
        self.check_failure("download")?;
        let state = self.state.lock();
        let record = state
            .files
            .get(file_id)
            .ok_or_else(|| GatewayError::NotFound(file_id.to_string()))?;
        let bytes = state
            .contents
            .get(file_id)
            .cloned()
            .unwrap_or_else(|| vec![0u8; record.size_bytes as usize]);
        let bytes: Vec<u8> = bytes.into_iter().take(byte_limit as usize).collect();
        self.downloaded_bytes
            .fetch_add(bytes.len() as u64, Ordering::SeqCst);
        Ok(bytes)
    }
}
