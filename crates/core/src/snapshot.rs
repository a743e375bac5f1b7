// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot metadata. Record data itself is streamed through the storage
//! port; components share snapshots by id only.

use crate::{ScanId, SnapshotId, UserKey};
use serde::{Deserialize, Serialize};

/// Header for an immutable point-in-time capture of a user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: SnapshotId,
    pub scan_id: ScanId,
    pub user_key: UserKey,
    pub taken_at_ms: u64,
    pub total_files: u64,
    pub total_bytes: u64,
}
