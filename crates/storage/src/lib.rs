// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ds-storage: Persistence ports and backends.
//!
//! The engines never reference a concrete backend; they hold trait objects
//! for four narrow concerns: sealed credentials, scan jobs (with their
//! checkpoints), snapshots, and action batches. Two backends ship here: an
//! in-memory store for tests and a filesystem store whose writes are
//! atomic (tmp file, fsync, rename) so a crash never leaves a half-written
//! record behind.

mod error;
mod fs;
mod memory;
mod port;

pub use error::StorageError;
pub use fs::FsStorage;
pub use memory::MemoryStorage;
pub use port::{BatchStore, CredentialStore, RecordIter, ScanStore, SnapshotStore};
