// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "Report.pdf", "report.pdf" },
    spaces = { "My Great Report.pdf", "my_great_report.pdf" },
    copy_marker = { "budget_copy.xlsx", "budget.xlsx" },
    numbered = { "Report (1).pdf", "report.pdf" },
    version = { "slides_v3.pptx", "slides.pptx" },
    final_marker = { "thesis_final.docx", "thesis.docx" },
    draft_marker = { "plan draft.txt", "plan.txt" },
    stacked = { "Report_final (2).pdf", "report.pdf" },
    punctuation = { "notes: today!.md", "notes_today.md" },
    no_extension = { "README", "readme" },
)]
fn normalization(input: &str, expected: &str) {
    assert_eq!(normalize_name(input), expected);
}

#[test]
fn normalization_is_idempotent() {
    for name in ["Report (1).pdf", "a b c_final.txt", "x_v10_copy.png"] {
        let once = normalize_name(name);
        assert_eq!(normalize_name(&once), once);
    }
}

#[parameterized(
    numbered = { "Report (1).pdf", true },
    copy_marker = { "Report_copy.pdf", true },
    copy_with_number = { "Report copy 2.pdf", true },
    versioned = { "Report_v2.pdf", true },
    final_marker = { "Report_final.pdf", true },
    draft_marker = { "Report-draft.pdf", true },
    clean = { "Report.pdf", false },
    version_inside = { "v2_engine_notes.pdf", false },
)]
fn version_detection(name: &str, expected: bool) {
    assert_eq!(matches_version_pattern(name), expected);
}

#[test]
fn hidden_files_keep_their_name() {
    assert_eq!(normalize_name(".bashrc"), ".bashrc");
}
