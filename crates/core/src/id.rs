// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed identifiers.
//!
//! Every cross-component handle is an opaque string wrapped in its own
//! type, so a scan id cannot land where a batch id belongs. File ids are
//! allocated by the remote service; everything else comes from an
//! [`IdGen`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declare the fixed set of id newtypes in one place. Each is a plain
/// string wrapper with construction, borrowing, and display; identity is
/// string equality.
macro_rules! ids {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

ids! {
    /// Opaque per-user identifier used for credential and job scoping.
    UserKey,
    /// Unique identifier for a scan job.
    ScanId,
    /// Unique identifier for a finalized scan snapshot.
    SnapshotId,
    /// Remote file identifier, assigned by the external file service.
    FileId,
    /// Unique identifier for an action batch.
    BatchId,
    /// Unique identifier for a single proposal within a batch.
    ProposalId,
    /// Unique identifier for a duplicate group.
    GroupId,
}

/// Generates unique identifiers
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

/// UUID-based ID generator for production use
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sequential ID generator for deterministic tests ("id-1", "id-2", ...).
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct SeqIdGen {
    prefix: &'static str,
    counter: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(any(test, feature = "test-support"))]
impl SeqIdGen {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl IdGen for SeqIdGen {
    fn next(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod id_tests;
