// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry: the single piece of process-wide mutable state.
//!
//! Admission is a compare-and-swap under one mutex: a scan is admitted
//! only if the user has no scan in an active status, and an action batch
//! only if none is executing. Release happens on terminal status.

use ds_core::{BatchId, ErrorCode, ErrorReport, ScanId, UserKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from admission CAS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a scan is already active for this user: {existing}")]
    ScanAlreadyActive { existing: ScanId },
    #[error("a batch is already executing for this user: {existing}")]
    BatchAlreadyExecuting { existing: BatchId },
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::ScanAlreadyActive { .. } => ErrorCode::ScanAlreadyActive,
            RegistryError::BatchAlreadyExecuting { .. } => ErrorCode::BatchStateInvalid,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}

#[derive(Default)]
struct Slots {
    scans: HashMap<UserKey, ScanId>,
    batches: HashMap<UserKey, BatchId>,
}

/// In-memory slot table. One per process.
#[derive(Default)]
pub struct JobRegistry {
    slots: Mutex<Slots>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a scan for the user. Fails if one is already active.
    pub fn admit_scan(&self, user: &UserKey, scan_id: &ScanId) -> Result<(), RegistryError> {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.scans.get(user) {
            return Err(RegistryError::ScanAlreadyActive {
                existing: existing.clone(),
            });
        }
        slots.scans.insert(user.clone(), scan_id.clone());
        Ok(())
    }

    /// Release the user's scan slot. Only the owning scan releases it;
    /// a stale release from an older job is ignored.
    pub fn release_scan(&self, user: &UserKey, scan_id: &ScanId) {
        let mut slots = self.slots.lock();
        if slots.scans.get(user) == Some(scan_id) {
            slots.scans.remove(user);
        }
    }

    pub fn active_scan(&self, user: &UserKey) -> Option<ScanId> {
        self.slots.lock().scans.get(user).cloned()
    }

    /// Admit a batch execution for the user.
    pub fn admit_batch(&self, user: &UserKey, batch_id: &BatchId) -> Result<(), RegistryError> {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.batches.get(user) {
            return Err(RegistryError::BatchAlreadyExecuting {
                existing: existing.clone(),
            });
        }
        slots.batches.insert(user.clone(), batch_id.clone());
        Ok(())
    }

    pub fn release_batch(&self, user: &UserKey, batch_id: &BatchId) {
        let mut slots = self.slots.lock();
        if slots.batches.get(user) == Some(batch_id) {
            slots.batches.remove(user);
        }
    }

    pub fn executing_batch(&self, user: &UserKey) -> Option<BatchId> {
        self.slots.lock().batches.get(user).cloned()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
