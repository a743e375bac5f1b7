// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ds_core::{Capabilities, FileId, MimeCategory};
use yare::parameterized;

const DAY: u64 = 24 * 60 * 60 * 1000;
const NOW: u64 = 400 * DAY;

fn record(name: &str, size: u64, modified_at_ms: u64, shared: bool) -> FileRecord {
    FileRecord {
        id: FileId::new("f"),
        name: name.to_string(),
        mime: MimeCategory::Document,
        size_bytes: size,
        modified_at_ms,
        created_at_ms: 0,
        parent_ids: vec![FileId::new("root")],
        shared,
        collaborator_count: 0,
        trashed: false,
        checksum: None,
        capabilities: Capabilities::ALL,
    }
}

#[parameterized(
    // 50 base + 10 nonempty + 15 recent
    fresh_small = { record("a.txt", 10, NOW - DAY, false), 75 },
    // + 5 for > 1 MiB
    fresh_large = { record("a.txt", 2 * 1024 * 1024, NOW - DAY, false), 80 },
    // 90-day bucket
    quarter_old = { record("a.txt", 10, NOW - 60 * DAY, false), 70 },
    // 365-day bucket
    year_old = { record("a.txt", 10, NOW - 180 * DAY, false), 65 },
    // no recency bonus
    ancient = { record("a.txt", 10, 0, false), 60 },
    // empty file loses the size bonus
    empty = { record("a.txt", 0, NOW - DAY, false), 65 },
    // copy penalty
    copy_name = { record("a copy.txt", 10, NOW - DAY, false), 55 },
    // "(1)" outranks the copy penalty branch
    numbered = { record("a (1).txt", 10, NOW - DAY, false), 50 },
    // draft penalty
    draft = { record("a draft.txt", 10, NOW - DAY, false), 65 },
    // final bonus
    final_name = { record("a final.txt", 10, NOW - DAY, false), 85 },
    // backup penalty
    backup = { record("a backup.txt", 10, NOW - DAY, false), 60 },
    // shared bonus
    shared = { record("a.txt", 10, NOW - DAY, true), 85 },
)]
fn scoring(record: FileRecord, expected: u8) {
    assert_eq!(quality_score(&record, NOW), expected);
}

#[test]
fn score_is_clamped_to_bounds() {
    // every penalty at once still floors at 0
    let worst = record("backup copy (1) draft.txt", 0, 0, false);
    assert_eq!(quality_score(&worst, NOW), 0);
    // every bonus at once caps at 100
    let best = record("final.txt", 2 * 1024 * 1024, NOW, true);
    assert!(quality_score(&best, NOW) <= 100);
}
