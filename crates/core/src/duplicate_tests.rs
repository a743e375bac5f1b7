// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn group(risk: Risk, reclaimable: u64) -> DuplicateGroup {
    DuplicateGroup {
        id: GroupId::new("g1"),
        match_kind: MatchKind::ExactChecksum,
        confidence: 100,
        members: vec![
            GroupMember {
                file_id: FileId::new("a"),
                quality_score: 80,
            },
            GroupMember {
                file_id: FileId::new("b"),
                quality_score: 40,
            },
        ],
        recommendation: Recommendation::KeepBest {
            keep_id: FileId::new("a"),
            delete_ids: vec![FileId::new("b")],
            reason_code: "highest_quality".into(),
        },
        space_reclaimable: reclaimable,
        risk,
    }
}

#[test]
fn summary_tallies_groups_and_risk() {
    let groups = vec![group(Risk::Low, 100), group(Risk::Medium, 50), group(Risk::Low, 25)];
    let summary = DuplicateSummary::tally(&groups);
    assert_eq!(summary.total_groups, 3);
    assert_eq!(summary.duplicate_members, 6);
    assert_eq!(summary.reclaimable_bytes, 175);
    assert_eq!(summary.low_risk_groups, 2);
    assert_eq!(summary.medium_risk_groups, 1);
    assert_eq!(summary.high_risk_groups, 0);
}

#[test]
fn match_kind_wire_spelling() {
    let json = serde_json::to_string(&MatchKind::VersionSibling).unwrap();
    assert_eq!(json, "\"version_sibling\"");
    assert_eq!(MatchKind::ExactChecksum.to_string(), "exact_checksum");
}

#[test]
fn recommendation_is_tagged_by_kind() {
    let rec = Recommendation::ManualReview {
        reason_code: "low_confidence".into(),
    };
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["kind"], "manual_review");
}

#[test]
fn risk_orders_low_to_high() {
    assert!(Risk::Low < Risk::Medium);
    assert!(Risk::Medium < Risk::High);
}
