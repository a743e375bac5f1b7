// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn user(n: &str) -> UserKey {
    UserKey::new(n)
}

#[test]
fn second_scan_for_same_user_is_refused() {
    let registry = JobRegistry::new();
    registry.admit_scan(&user("u1"), &ScanId::new("s1")).unwrap();
    let err = registry
        .admit_scan(&user("u1"), &ScanId::new("s2"))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::ScanAlreadyActive {
            existing: ScanId::new("s1")
        }
    );
    assert_eq!(registry.active_scan(&user("u1")), Some(ScanId::new("s1")));
}

#[test]
fn different_users_scan_in_parallel() {
    let registry = JobRegistry::new();
    registry.admit_scan(&user("u1"), &ScanId::new("s1")).unwrap();
    registry.admit_scan(&user("u2"), &ScanId::new("s2")).unwrap();
}

#[test]
fn release_frees_the_slot() {
    let registry = JobRegistry::new();
    registry.admit_scan(&user("u1"), &ScanId::new("s1")).unwrap();
    registry.release_scan(&user("u1"), &ScanId::new("s1"));
    registry.admit_scan(&user("u1"), &ScanId::new("s2")).unwrap();
}

#[test]
fn stale_release_is_ignored() {
    let registry = JobRegistry::new();
    registry.admit_scan(&user("u1"), &ScanId::new("s1")).unwrap();
    registry.release_scan(&user("u1"), &ScanId::new("old"));
    assert_eq!(registry.active_scan(&user("u1")), Some(ScanId::new("s1")));
}

#[test]
fn batch_slots_are_independent_of_scan_slots() {
    let registry = JobRegistry::new();
    registry.admit_scan(&user("u1"), &ScanId::new("s1")).unwrap();
    registry.admit_batch(&user("u1"), &BatchId::new("b1")).unwrap();
    let err = registry
        .admit_batch(&user("u1"), &BatchId::new("b2"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::BatchAlreadyExecuting { .. }));
    registry.release_batch(&user("u1"), &BatchId::new("b1"));
    assert!(registry.executing_batch(&user("u1")).is_none());
}

#[test]
fn error_codes_map_to_conflicts() {
    let err = RegistryError::ScanAlreadyActive {
        existing: ScanId::new("s"),
    };
    assert_eq!(err.code(), ErrorCode::ScanAlreadyActive);
    assert!(!err.report().retryable);
}
