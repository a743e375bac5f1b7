// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proposals: single intended changes to one remote file.

use crate::{FileId, ProposalId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target folder of a move/copy. `Pending` references a `create_folder`
/// proposal in the same batch whose id is not known until execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ref", rename_all = "snake_case")]
pub enum FolderRef {
    Existing { id: FileId },
    Pending { proposal: ProposalId },
}

/// The operation a proposal asks for, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalKind {
    Move { destination: FolderRef },
    Rename { new_name: String },
    Trash,
    Archive,
    Copy {
        destination: FolderRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_name: Option<String>,
    },
    CreateFolder { parent: FolderRef, name: String },
}

impl ProposalKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProposalKind::Move { .. } => "move",
            ProposalKind::Rename { .. } => "rename",
            ProposalKind::Trash => "trash",
            ProposalKind::Archive => "archive",
            ProposalKind::Copy { .. } => "copy",
            ProposalKind::CreateFolder { .. } => "create_folder",
        }
    }

    /// Folder proposals in the same batch this kind depends on.
    pub fn pending_dependency(&self) -> Option<&ProposalId> {
        match self {
            ProposalKind::Move {
                destination: FolderRef::Pending { proposal },
            }
            | ProposalKind::Copy {
                destination: FolderRef::Pending { proposal },
                ..
            }
            | ProposalKind::CreateFolder {
                parent: FolderRef::Pending { proposal },
                ..
            } => Some(proposal),
            _ => None,
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Execution priority derived from proposal confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Hints attached by the analyzer for the preflight to weigh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFlag {
    Shared,
    ManyCollaborators,
    LargeFile,
    CloudNative,
}

/// How cautious the preflight policy is for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Aggressive,
    #[default]
    Normal,
    Conservative,
}

/// One intended change to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// Subject file. For `create_folder` this is the id the caller uses to
    /// reference the proposal, not a live remote file.
    pub file_id: FileId,
    #[serde(flatten)]
    pub kind: ProposalKind,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_flags: Vec<SafetyFlag>,
}

#[cfg(test)]
#[path = "proposal_tests.rs"]
mod proposal_tests;
