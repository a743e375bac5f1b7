// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ds-core: Shared domain types for the Drivesweep organizer.
//!
//! Everything that crosses a component boundary lives here: identifiers,
//! the file/scan/batch data model, progress events, configuration, the
//! user-visible error envelope, and the clock abstraction the engines use
//! so that expiry windows are testable.

pub mod batch;
pub mod clock;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod event;
pub mod file;
pub mod id;
pub mod proposal;
pub mod scan;
pub mod snapshot;

pub use batch::{
    ActionBatch, BatchStatus, BatchTransitionError, ExecutionResult, OutcomeStatus, RestoreLog,
    RollbackEntry, RollbackPlan,
};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use config::{
    ActionSettings, AuthSettings, Config, DupSettings, GatewaySettings, ScanSettings,
    TokenSettings,
};
pub use duplicate::{
    DuplicateGroup, DuplicateSummary, GroupMember, MatchKind, Recommendation, Risk,
};
pub use error::{ErrorCode, ErrorReport};
pub use event::{EventKind, ProgressEvent, Topic};
pub use file::{Capabilities, FileRecord, MimeCategory};
pub use id::{BatchId, FileId, GroupId, IdGen, ProposalId, ScanId, SnapshotId, UserKey, UuidIdGen};
#[cfg(any(test, feature = "test-support"))]
pub use id::SeqIdGen;
pub use proposal::{FolderRef, Priority, Proposal, ProposalKind, SafetyFlag, SafetyLevel};
pub use scan::{
    QueuedFolder, ScanCheckpoint, ScanConfig, ScanJob, ScanProgress, ScanStatus,
    ScanTransitionError,
};
pub use snapshot::SnapshotMeta;
