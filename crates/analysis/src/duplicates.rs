// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-pass duplicate detection.
//!
//! Pass order: exact remote checksum, size+normalized-name identity,
//! bounded content hashing (deep only), fuzzy name with near-size
//! (thorough and deep). A file that joins a group in one pass is excluded
//! from later passes. Content hashing downloads through the gateway under
//! a per-file size cap and an aggregate byte cap per run.

use crate::error::AnalysisError;
use crate::normalize::{matches_version_pattern, normalize_name};
use crate::quality::quality_score;
use ds_core::{
    Clock, DupSettings, DuplicateGroup, DuplicateSummary, FileId, FileRecord, GroupId,
    GroupMember, IdGen, MatchKind, Recommendation, Risk, UuidIdGen,
};
use ds_gateway::{Ctx, Gateway};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// How much work a detection run may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmDepth {
    /// Checksum and size+name passes only.
    Fast,
    /// Adds fuzzy-name matching.
    #[default]
    Thorough,
    /// Adds content hashing of undecided files.
    Deep,
}

/// Per-run options on top of the configured [`DupSettings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    pub depth: AlgorithmDepth,
    pub enable_content_hashing: bool,
    pub enable_fuzzy_name: bool,
    /// Overrides the configured minimum size when set.
    pub min_file_size: Option<u64>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            depth: AlgorithmDepth::Thorough,
            enable_content_hashing: true,
            enable_fuzzy_name: true,
            min_file_size: None,
        }
    }
}

/// Output of a detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub groups: Vec<DuplicateGroup>,
    pub summary: DuplicateSummary,
}

/// Reads a snapshot's records and produces duplicate groups.
pub struct DuplicateEngine<G: IdGen = UuidIdGen> {
    gateway: Arc<Gateway>,
    clock: Arc<dyn Clock>,
    ids: G,
    settings: DupSettings,
}

impl<G: IdGen> DuplicateEngine<G> {
    pub fn new(gateway: Arc<Gateway>, clock: Arc<dyn Clock>, ids: G, settings: DupSettings) -> Self {
        Self {
            gateway,
            clock,
            ids,
            settings,
        }
    }

    /// Run detection over snapshot records. Only the deep content-hash
    /// pass touches the remote; everything else is local.
    pub async fn detect(
        &self,
        ctx: &Ctx,
        records: impl IntoIterator<Item = FileRecord>,
        options: &DetectOptions,
    ) -> Result<DetectReport, AnalysisError> {
        let min_size = options.min_file_size.unwrap_or(self.settings.min_file_size);
        let candidates: Vec<FileRecord> = records
            .into_iter()
            .filter(|r| !r.is_folder() && !r.trashed && r.size_bytes >= min_size)
            .collect();
        let now = self.clock.epoch_ms();

        let mut grouped: HashSet<FileId> = HashSet::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        // pass 1: exact remote checksum
        let mut by_checksum: HashMap<(String, u64), Vec<&FileRecord>> = HashMap::new();
        for record in candidates.iter() {
            if let Some(checksum) = &record.checksum {
                by_checksum
                    .entry((checksum.clone(), record.size_bytes))
                    .or_default()
                    .push(record);
            }
        }
        self.collect_groups(
            &mut groups,
            &mut grouped,
            by_checksum.into_values(),
            MatchKind::ExactChecksum,
            100,
            now,
        );

        // pass 2: size + normalized name identity
        let mut by_size_name: HashMap<(String, u64), Vec<&FileRecord>> = HashMap::new();
        for record in remaining(&candidates, &grouped) {
            by_size_name
                .entry((normalize_name(&record.name), record.size_bytes))
                .or_default()
                .push(record);
        }
        self.collect_groups(
            &mut groups,
            &mut grouped,
            by_size_name.into_values(),
            MatchKind::SizeName,
            90,
            now,
        );

        // pass 3 (deep): bounded content hashing
        if options.depth == AlgorithmDepth::Deep && options.enable_content_hashing {
            if ctx.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let hashed = self.hash_pass(ctx, &candidates, &grouped).await?;
            self.collect_groups(
                &mut groups,
                &mut grouped,
                hashed.into_values(),
                MatchKind::ContentHash,
                95,
                now,
            );
        }

        // pass 4 (thorough+deep): fuzzy name with near size
        if options.depth != AlgorithmDepth::Fast && options.enable_fuzzy_name {
            self.fuzzy_pass(&candidates, &mut grouped, &mut groups, now);
        }

        let summary = DuplicateSummary::tally(&groups);
        debug!(
            groups = summary.total_groups,
            reclaimable = summary.reclaimable_bytes,
            "duplicate detection finished"
        );
        Ok(DetectReport { groups, summary })
    }

    /// Download and SHA-256 undecided files under the caps, keyed by
    /// (digest, size).
    async fn hash_pass(
        &self,
        ctx: &Ctx,
        candidates: &[FileRecord],
        grouped: &HashSet<FileId>,
    ) -> Result<HashMap<(String, u64), Vec<FileRecord>>, AnalysisError> {
        let mut budget = self.settings.content_hash_aggregate_cap;
        let mut by_digest: HashMap<(String, u64), Vec<FileRecord>> = HashMap::new();

        // Only sizes that appear at least twice can produce a group;
        // hashing singles would spend the budget for nothing.
        let mut size_counts: HashMap<u64, u32> = HashMap::new();
        for record in remaining(candidates, grouped) {
            *size_counts.entry(record.size_bytes).or_default() += 1;
        }

        for record in remaining(candidates, grouped) {
            if ctx.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            if record.size_bytes > self.settings.content_hash_size_cap {
                continue;
            }
            if size_counts.get(&record.size_bytes).copied().unwrap_or(0) < 2 {
                continue;
            }
            if record.size_bytes > budget {
                debug!(file_id = %record.id, "aggregate hash budget exhausted, skipping");
                continue;
            }
            match self
                .gateway
                .download(ctx, &record.id, self.settings.content_hash_size_cap)
                .await
            {
                Ok(bytes) => {
                    budget -= record.size_bytes.min(budget);
                    let digest = format!("{:x}", Sha256::digest(&bytes));
                    by_digest
                        .entry((digest, record.size_bytes))
                        .or_default()
                        .push(record.clone());
                }
                Err(e) => {
                    // a single failed download only costs coverage
                    warn!(file_id = %record.id, error = %e, "content hash download failed");
                }
            }
        }
        Ok(by_digest)
    }

    /// Cluster leftover files whose normalized names are close and whose
    /// sizes differ by under 10%.
    fn fuzzy_pass(
        &self,
        candidates: &[FileRecord],
        grouped: &mut HashSet<FileId>,
        groups: &mut Vec<DuplicateGroup>,
        now: u64,
    ) {
        let leftover: Vec<&FileRecord> = remaining(candidates, grouped);
        let mut clustered: HashSet<usize> = HashSet::new();

        for i in 0..leftover.len() {
            if clustered.contains(&i) {
                continue;
            }
            let mut cluster = vec![leftover[i]];
            let mut worst_similarity: f64 = 1.0;
            let anchor = normalize_name(&leftover[i].name);
            for (j, other) in leftover.iter().enumerate().skip(i + 1) {
                if clustered.contains(&j) {
                    continue;
                }
                let similarity =
                    strsim::normalized_levenshtein(&anchor, &normalize_name(&other.name));
                if similarity < 0.8 {
                    continue;
                }
                let max_size = leftover[i].size_bytes.max(other.size_bytes);
                if max_size == 0 {
                    continue;
                }
                let diff = leftover[i].size_bytes.abs_diff(other.size_bytes);
                if (diff as f64) / (max_size as f64) >= 0.1 {
                    continue;
                }
                cluster.push(*other);
                worst_similarity = worst_similarity.min(similarity);
                clustered.insert(j);
            }
            if cluster.len() < 2 {
                continue;
            }
            clustered.insert(i);

            let versioned = cluster.iter().any(|r| matches_version_pattern(&r.name));
            let kind = if versioned {
                MatchKind::VersionSibling
            } else {
                MatchKind::FuzzyName
            };
            // confidence 75..=85 scaled by how close the names are
            let confidence = 75 + ((worst_similarity - 0.8) / 0.2 * 10.0).round() as u8;
            let owned: Vec<FileRecord> = cluster.into_iter().cloned().collect();
            for record in &owned {
                grouped.insert(record.id.clone());
            }
            groups.push(self.build_group(owned, kind, confidence.min(85), now));
        }
    }

    fn collect_groups<I, R>(
        &self,
        groups: &mut Vec<DuplicateGroup>,
        grouped: &mut HashSet<FileId>,
        buckets: I,
        kind: MatchKind,
        confidence: u8,
        now: u64,
    ) where
        I: Iterator<Item = Vec<R>>,
        R: AsFileRecord,
    {
        for bucket in buckets {
            if bucket.len() < 2 {
                continue;
            }
            let members: Vec<FileRecord> =
                bucket.iter().map(|r| r.as_record().clone()).collect();
            for record in &members {
                grouped.insert(record.id.clone());
            }
            groups.push(self.build_group(members, kind, confidence, now));
        }
    }

    fn build_group(
        &self,
        members: Vec<FileRecord>,
        kind: MatchKind,
        confidence: u8,
        now: u64,
    ) -> DuplicateGroup {
        let scored: Vec<GroupMember> = members
            .iter()
            .map(|record| GroupMember {
                file_id: record.id.clone(),
                quality_score: quality_score(record, now),
            })
            .collect();

        // Version siblings keep the most recent save: the suffix marks an
        // older generation, so modification time outranks the name-based
        // score there. Every other kind keeps the highest-quality member.
        let keep = match kind {
            MatchKind::VersionSibling => members
                .iter()
                .zip(&scored)
                .max_by_key(|(record, member)| (record.modified_at_ms, member.quality_score))
                .map(|(record, _)| record.id.clone()),
            _ => scored
                .iter()
                .max_by_key(|m| m.quality_score)
                .map(|m| m.file_id.clone()),
        };
        let sizes: HashMap<&FileId, u64> =
            members.iter().map(|r| (&r.id, r.size_bytes)).collect();

        let (recommendation, space_reclaimable) = match keep {
            Some(keep_id) if confidence >= 80 => {
                let delete_ids: Vec<FileId> = scored
                    .iter()
                    .filter(|m| m.file_id != keep_id)
                    .map(|m| m.file_id.clone())
                    .collect();
                let reclaimable = delete_ids
                    .iter()
                    .map(|id| sizes.get(id).copied().unwrap_or(0))
                    .sum();
                (
                    Recommendation::KeepBest {
                        keep_id,
                        delete_ids,
                        reason_code: "highest_quality".into(),
                    },
                    reclaimable,
                )
            }
            _ => (
                Recommendation::ManualReview {
                    reason_code: "low_confidence".into(),
                },
                0,
            ),
        };

        let risk = match kind {
            MatchKind::ExactChecksum | MatchKind::ContentHash | MatchKind::SizeName => Risk::Low,
            MatchKind::FuzzyName | MatchKind::VersionSibling => {
                let keeper_score = scored.iter().map(|m| m.quality_score).max().unwrap_or(0);
                if keeper_score < 40 {
                    Risk::High
                } else {
                    Risk::Medium
                }
            }
        };

        DuplicateGroup {
            id: GroupId::new(self.ids.next()),
            match_kind: kind,
            confidence,
            members: scored,
            recommendation,
            space_reclaimable,
            risk,
        }
    }
}

fn remaining<'a>(candidates: &'a [FileRecord], grouped: &HashSet<FileId>) -> Vec<&'a FileRecord> {
    candidates
        .iter()
        .filter(|r| !grouped.contains(&r.id))
        .collect()
}

/// Lets [`DuplicateEngine::collect_groups`] accept buckets of owned
/// records or references alike.
trait AsFileRecord {
    fn as_record(&self) -> &FileRecord;
}

impl AsFileRecord for FileRecord {
    fn as_record(&self) -> &FileRecord {
        self
    }
}

impl AsFileRecord for &FileRecord {
    fn as_record(&self) -> &FileRecord {
        self
    }
}

#[cfg(test)]
#[path = "duplicates_tests.rs"]
mod duplicates_tests;
