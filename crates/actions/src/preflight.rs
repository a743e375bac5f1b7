// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file safety preflight.
//!
//! Evaluated against the file's current remote state, not the snapshot it
//! was proposed from. Any skip condition wins over warnings; warnings
//! accumulate.

use ds_core::{FileRecord, ProposalKind, SafetyLevel};

/// File size above which every safety level warns.
const LARGE_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Outcome of the preflight for one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightDecision {
    Allow,
    /// Proceed, reporting these warnings on the result.
    Warn(Vec<String>),
    /// Do not execute; the reason code lands on the skipped result.
    Skip(String),
}

impl PreflightDecision {
    pub fn warnings(&self) -> Vec<String> {
        match self {
            PreflightDecision::Warn(warnings) => warnings.clone(),
            _ => Vec::new(),
        }
    }
}

/// Evaluate the policy table for one proposal against live file state.
pub fn preflight(
    record: &FileRecord,
    kind: &ProposalKind,
    safety: SafetyLevel,
) -> PreflightDecision {
    let mut warnings: Vec<String> = Vec::new();
    let destructive = matches!(kind, ProposalKind::Trash | ProposalKind::Archive);

    if record.shared {
        match safety {
            SafetyLevel::Aggressive => {}
            SafetyLevel::Normal => {
                if destructive {
                    warnings.push("destructive operation on a shared file".into());
                } else {
                    warnings.push("file is shared".into());
                }
            }
            SafetyLevel::Conservative => {
                return PreflightDecision::Skip("shared".into());
            }
        }
    }

    if record.collaborator_count > 0 && safety != SafetyLevel::Aggressive {
        warnings.push(format!(
            "{} additional collaborators",
            record.collaborator_count
        ));
    }

    if record.size_bytes > LARGE_FILE_BYTES {
        warnings.push("file larger than 100 MiB".into());
    }

    if !record.capabilities.can_edit && record.mime.is_cloud_native() {
        match safety {
            SafetyLevel::Aggressive => {}
            SafetyLevel::Normal => warnings.push("no edit capability on a cloud-native document".into()),
            SafetyLevel::Conservative => {
                return PreflightDecision::Skip("not_editable".into());
            }
        }
    }

    if warnings.is_empty() {
        PreflightDecision::Allow
    } else {
        PreflightDecision::Warn(warnings)
    }
}

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod preflight_tests;
