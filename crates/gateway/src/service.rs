// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port to the external file service.
//!
//! Implementations own the HTTP binding and response classification; the
//! gateway layers credentials, rate limiting, retries, and the circuit
//! breaker on top. Methods take a bearer token because credential
//! injection happens above this seam.

use crate::GatewayError;
use async_trait::async_trait;
use ds_core::{FileId, FileRecord};

/// One page of a folder listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<FileRecord>,
    pub next_cursor: Option<String>,
}

/// Raw capability surface of the remote file service.
#[async_trait]
pub trait RemoteFileService: Send + Sync {
    async fn list_children(
        &self,
        token: &str,
        folder_id: &FileId,
        cursor: Option<&str>,
    ) -> Result<Page, GatewayError>;

    async fn get_file(&self, token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError>;

    async fn create_folder(
        &self,
        token: &str,
        parent_id: &FileId,
        name: &str,
    ) -> Result<FileRecord, GatewayError>;

    async fn move_file(
        &self,
        token: &str,
        file_id: &FileId,
        add_parents: &[FileId],
        remove_parents: &[FileId],
    ) -> Result<FileRecord, GatewayError>;

    async fn rename(
        &self,
        token: &str,
        file_id: &FileId,
        new_name: &str,
    ) -> Result<FileRecord, GatewayError>;

    async fn trash(&self, token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError>;

    async fn untrash(&self, token: &str, file_id: &FileId) -> Result<FileRecord, GatewayError>;

    async fn copy(
        &self,
        token: &str,
        file_id: &FileId,
        parent_id: &FileId,
        new_name: Option<&str>,
    ) -> Result<FileRecord, GatewayError>;

    /// Bounded download used only for content hashing.
    async fn download(
        &self,
        token: &str,
        file_id: &FileId,
        byte_limit: u64,
    ) -> Result<Vec<u8>, GatewayError>;
}
