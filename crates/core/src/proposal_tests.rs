// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_names_match_wire_spelling() {
    let kind = ProposalKind::CreateFolder {
        parent: FolderRef::Existing {
            id: FileId::new("root"),
        },
        name: "Archive".into(),
    };
    assert_eq!(kind.name(), "create_folder");
    assert_eq!(kind.to_string(), "create_folder");
}

#[test]
fn pending_dependency_found_for_move() {
    let kind = ProposalKind::Move {
        destination: FolderRef::Pending {
            proposal: ProposalId::new("p1"),
        },
    };
    assert_eq!(kind.pending_dependency(), Some(&ProposalId::new("p1")));
}

#[test]
fn existing_destination_has_no_dependency() {
    let kind = ProposalKind::Move {
        destination: FolderRef::Existing {
            id: FileId::new("folder"),
        },
    };
    assert!(kind.pending_dependency().is_none());
    assert!(ProposalKind::Trash.pending_dependency().is_none());
}

#[test]
fn nested_create_folder_dependency() {
    let kind = ProposalKind::CreateFolder {
        parent: FolderRef::Pending {
            proposal: ProposalId::new("outer"),
        },
        name: "Inner".into(),
    };
    assert_eq!(kind.pending_dependency(), Some(&ProposalId::new("outer")));
}

#[test]
fn proposal_serde_flattens_kind() {
    let proposal = Proposal {
        id: ProposalId::new("p1"),
        file_id: FileId::new("f1"),
        kind: ProposalKind::Rename {
            new_name: "tidy.txt".into(),
        },
        priority: Priority::High,
        safety_flags: vec![SafetyFlag::Shared],
    };
    let json = serde_json::to_value(&proposal).unwrap();
    assert_eq!(json["kind"], "rename");
    assert_eq!(json["new_name"], "tidy.txt");
    let back: Proposal = serde_json::from_value(json).unwrap();
    assert_eq!(back, proposal);
}

#[test]
fn priority_ordering() {
    assert!(Priority::Low < Priority::Medium);
    assert!(Priority::Medium < Priority::High);
}

#[test]
fn default_safety_level_is_normal() {
    assert_eq!(SafetyLevel::default(), SafetyLevel::Normal);
}
