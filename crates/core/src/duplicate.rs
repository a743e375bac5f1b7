// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate group model produced by the duplicate engine.

use crate::{FileId, GroupId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which detection pass produced a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactChecksum,
    ContentHash,
    SizeName,
    FuzzyName,
    VersionSibling,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::ExactChecksum => "exact_checksum",
            MatchKind::ContentHash => "content_hash",
            MatchKind::SizeName => "size_name",
            MatchKind::FuzzyName => "fuzzy_name",
            MatchKind::VersionSibling => "version_sibling",
        };
        write!(f, "{s}")
    }
}

/// How dangerous acting on the group's recommendation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Low,
    Medium,
    High,
}

/// Group member with its keep-candidate score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub file_id: FileId,
    /// 0..=100; higher means a better candidate to keep.
    pub quality_score: u8,
}

/// Per-group resolution recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Confident enough to name a keeper and deletions.
    KeepBest {
        keep_id: FileId,
        delete_ids: Vec<FileId>,
        reason_code: String,
    },
    /// Confidence too low to act automatically.
    ManualReview { reason_code: String },
}

/// A set of files believed to hold the same (or nearly the same) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: GroupId,
    pub match_kind: MatchKind,
    /// 0..=100.
    pub confidence: u8,
    /// Always at least two members.
    pub members: Vec<GroupMember>,
    pub recommendation: Recommendation,
    /// Bytes freed if every delete candidate is removed.
    pub space_reclaimable: u64,
    pub risk: Risk,
}

/// Aggregate numbers for a detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSummary {
    pub total_groups: u64,
    pub duplicate_members: u64,
    pub reclaimable_bytes: u64,
    pub low_risk_groups: u64,
    pub medium_risk_groups: u64,
    pub high_risk_groups: u64,
}

impl DuplicateSummary {
    pub fn tally(groups: &[DuplicateGroup]) -> Self {
        let mut summary = Self::default();
        for group in groups {
            summary.total_groups += 1;
            summary.duplicate_members += group.members.len() as u64;
            summary.reclaimable_bytes += group.space_reclaimable;
            match group.risk {
                Risk::Low => summary.low_risk_groups += 1,
                Risk::Medium => summary.medium_risk_groups += 1,
                Risk::High => summary.high_risk_groups += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
#[path = "duplicate_tests.rs"]
mod duplicate_tests;
