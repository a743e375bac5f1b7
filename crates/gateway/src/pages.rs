// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Page fusion for folder listings.

use crate::ctx::Ctx;
use crate::gateway::Gateway;
use crate::GatewayError;
use ds_core::{FileId, FileRecord};
use std::collections::VecDeque;

/// Lazy sequence of a folder's children, chaining page cursors
/// transparently. Finite and not restartable: once consumed, a new
/// listing must start over.
pub struct ChildPages<'g> {
    gateway: &'g Gateway,
    ctx: Ctx,
    folder_id: FileId,
    cursor: Option<String>,
    buffer: VecDeque<FileRecord>,
    exhausted: bool,
}

impl<'g> ChildPages<'g> {
    pub(crate) fn new(gateway: &'g Gateway, ctx: Ctx, folder_id: FileId) -> Self {
        Self {
            gateway,
            ctx,
            folder_id,
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next child record, fetching further pages as needed. `None` once
    /// the listing is drained. After an `Err` the sequence is dead.
    pub async fn next(&mut self) -> Option<Result<FileRecord, GatewayError>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.exhausted {
                return None;
            }
            let page = self
                .gateway
                .list_children_page(&self.ctx, &self.folder_id, self.cursor.as_deref())
                .await;
            match page {
                Ok(page) => {
                    self.exhausted = page.next_cursor.is_none();
                    self.cursor = page.next_cursor;
                    self.buffer.extend(page.records);
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Cursor of the next unfetched page. Persist this to resume a
    /// listing later with [`Gateway::list_children_page`].
    pub fn resume_cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Drain the remainder into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<FileRecord>, GatewayError> {
        let mut records = Vec::new();
        while let Some(next) = self.next().await {
            records.push(next?);
        }
        Ok(records)
    }
}
