// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organization analyzer: candidate rules and per-file move proposals.
//!
//! Rules come from three groupings of the snapshot: classified category,
//! extension, and the large-file bucket. A rule is only emitted when its
//! bucket is big enough to be worth a folder. Each emitted rule carries a
//! `create_folder` proposal; the per-file moves reference it as a pending
//! destination so the action engine orders creation first.

use crate::classify::ClassifierHandle;
use ds_core::{
    FileId, FileRecord, FolderRef, IdGen, MimeCategory, Priority, Proposal, ProposalId,
    ProposalKind, SafetyFlag, UuidIdGen,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Bucket thresholds below which no rule is generated.
const CATEGORY_RULE_MIN: usize = 5;
const EXTENSION_RULE_MIN: usize = 10;
const LARGE_FILE_RULE_MIN: usize = 5;

/// Files at or above this size fall in the large-file bucket.
const LARGE_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Criteria fraction a file must match before a proposal is emitted.
const MATCH_THRESHOLD: f64 = 0.5;

/// A candidate organization rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgRule {
    pub name: String,
    /// Folder the rule files into.
    pub folder_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<MimeCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// 0..=100, `min(95, 60 + 2 * count)`.
    pub confidence: u8,
    pub member_count: usize,
}

impl OrgRule {
    fn criteria_count(&self) -> usize {
        usize::from(self.mime.is_some())
            + usize::from(self.extension.is_some())
            + usize::from(self.min_size.is_some())
    }

    /// Fraction of this rule's specified criteria the file matches.
    fn match_fraction(&self, record: &FileRecord, category: MimeCategory) -> f64 {
        let specified = self.criteria_count();
        if specified == 0 {
            return 0.0;
        }
        let mut matched = 0usize;
        if let Some(mime) = self.mime {
            if category == mime {
                matched += 1;
            }
        }
        if let Some(extension) = &self.extension {
            if record.extension().as_deref() == Some(extension.as_str()) {
                matched += 1;
            }
        }
        if let Some(min_size) = self.min_size {
            if record.size_bytes >= min_size {
                matched += 1;
            }
        }
        matched as f64 / specified as f64
    }
}

/// Rules plus the proposals derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgReport {
    pub rules: Vec<OrgRule>,
    pub proposals: Vec<Proposal>,
}

/// Read-only analyzer; its proposals feed the action engine.
pub struct OrganizationAnalyzer<G: IdGen = UuidIdGen> {
    classifier: ClassifierHandle,
    ids: G,
}

impl<G: IdGen> OrganizationAnalyzer<G> {
    pub fn new(classifier: ClassifierHandle, ids: G) -> Self {
        Self { classifier, ids }
    }

    pub async fn analyze(&self, records: impl IntoIterator<Item = FileRecord>) -> OrgReport {
        let files: Vec<FileRecord> = records
            .into_iter()
            .filter(|r| !r.is_folder() && !r.trashed)
            .collect();
        let categories = self.classifier.classify(&files).await;

        let rules = self.generate_rules(&files, &categories);
        let proposals = self.generate_proposals(&files, &categories, &rules);
        debug!(rules = rules.len(), proposals = proposals.len(), "organization analysis finished");
        OrgReport { rules, proposals }
    }

    fn generate_rules(
        &self,
        files: &[FileRecord],
        categories: &HashMap<FileId, MimeCategory>,
    ) -> Vec<OrgRule> {
        let mut rules = Vec::new();

        let mut by_category: HashMap<MimeCategory, usize> = HashMap::new();
        let mut by_extension: HashMap<String, (usize, HashMap<MimeCategory, usize>)> =
            HashMap::new();
        let mut large_count = 0usize;

        for record in files {
            let category = categories.get(&record.id).copied().unwrap_or(record.mime);
            if category != MimeCategory::Other {
                *by_category.entry(category).or_default() += 1;
            }
            if let Some(extension) = record.extension() {
                let entry = by_extension.entry(extension).or_default();
                entry.0 += 1;
                *entry.1.entry(category).or_default() += 1;
            }
            if record.size_bytes >= LARGE_FILE_BYTES {
                large_count += 1;
            }
        }

        for (category, count) in by_category {
            if count < CATEGORY_RULE_MIN {
                continue;
            }
            rules.push(OrgRule {
                name: format!("group-{category}"),
                folder_name: category_folder(category).to_string(),
                mime: Some(category),
                extension: None,
                min_size: None,
                confidence: rule_confidence(count),
                member_count: count,
            });
        }

        for (extension, (count, ext_categories)) in by_extension {
            if count < EXTENSION_RULE_MIN {
                continue;
            }
            // pair the extension with its dominant category so the rule
            // has two criteria to fraction-match against
            let dominant = ext_categories
                .iter()
                .max_by_key(|(_, n)| **n)
                .map(|(c, _)| *c);
            rules.push(OrgRule {
                name: format!("group-ext-{extension}"),
                folder_name: format!("{} files", extension.to_uppercase()),
                mime: dominant,
                extension: Some(extension),
                min_size: None,
                confidence: rule_confidence(count),
                member_count: count,
            });
        }

        if large_count >= LARGE_FILE_RULE_MIN {
            rules.push(OrgRule {
                name: "archive-large".to_string(),
                folder_name: "Large files".to_string(),
                mime: None,
                extension: None,
                min_size: Some(LARGE_FILE_BYTES),
                confidence: rule_confidence(large_count),
                member_count: large_count,
            });
        }

        rules
    }

    fn generate_proposals(
        &self,
        files: &[FileRecord],
        categories: &HashMap<FileId, MimeCategory>,
        rules: &[OrgRule],
    ) -> Vec<Proposal> {
        // one folder proposal per rule, created lazily on first use
        let mut folder_proposals: Vec<Option<Proposal>> = vec![None; rules.len()];
        // per file, the best (confidence, rule index)
        let mut best: HashMap<FileId, (f64, usize)> = HashMap::new();

        for record in files {
            let category = categories.get(&record.id).copied().unwrap_or(record.mime);
            for (rule_index, rule) in rules.iter().enumerate() {
                let fraction = rule.match_fraction(record, category);
                if fraction < MATCH_THRESHOLD {
                    continue;
                }
                let confidence = fraction * f64::from(rule.confidence);
                let keep = match best.get(&record.id) {
                    Some((existing, _)) => confidence > *existing,
                    None => true,
                };
                if keep {
                    best.insert(record.id.clone(), (confidence, rule_index));
                }
            }
        }

        let mut moves = Vec::new();
        let by_id: HashMap<&FileId, &FileRecord> = files.iter().map(|r| (&r.id, r)).collect();
        for (file_id, (confidence, rule_index)) in best {
            let folder_proposal = folder_proposals[rule_index].get_or_insert_with(|| Proposal {
                id: ProposalId::new(self.ids.next()),
                file_id: FileId::new(format!("pending-{}", rules[rule_index].name)),
                kind: ProposalKind::CreateFolder {
                    parent: FolderRef::Existing {
                        id: FileId::new("root"),
                    },
                    name: rules[rule_index].folder_name.clone(),
                },
                priority: Priority::High,
                safety_flags: Vec::new(),
            });
            let mut safety_flags = Vec::new();
            if let Some(record) = by_id.get(&file_id) {
                if record.shared {
                    safety_flags.push(SafetyFlag::Shared);
                }
                if record.size_bytes >= LARGE_FILE_BYTES {
                    safety_flags.push(SafetyFlag::LargeFile);
                }
            }
            moves.push(Proposal {
                id: ProposalId::new(self.ids.next()),
                file_id,
                kind: ProposalKind::Move {
                    destination: FolderRef::Pending {
                        proposal: folder_proposal.id.clone(),
                    },
                },
                priority: priority_for(confidence),
                safety_flags,
            });
        }

        // folders first, then moves in a stable order
        let mut proposals: Vec<Proposal> =
            folder_proposals.into_iter().flatten().collect();
        moves.sort_by(|a, b| a.file_id.cmp(&b.file_id));
        proposals.extend(moves);
        proposals
    }
}

fn rule_confidence(count: usize) -> u8 {
    (60 + 2 * count).min(95) as u8
}

fn priority_for(confidence: f64) -> Priority {
    if confidence > 80.0 {
        Priority::High
    } else if confidence > 60.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn category_folder(category: MimeCategory) -> &'static str {
    match category {
        MimeCategory::Document => "Documents",
        MimeCategory::Spreadsheet => "Spreadsheets",
        MimeCategory::Presentation => "Presentations",
        MimeCategory::Image => "Images",
        MimeCategory::Video => "Videos",
        MimeCategory::Pdf => "PDFs",
        MimeCategory::Folder | MimeCategory::Other => "Miscellaneous",
    }
}

#[cfg(test)]
#[path = "organizer_tests.rs"]
mod organizer_tests;
