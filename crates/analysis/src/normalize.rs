// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-name normalization and version-suffix detection.

use regex::Regex;
use std::sync::LazyLock;

/// Suffixes that mark a file as a versioned sibling of another:
/// " (1)", "_copy", "_v2", "_final", "_draft" and friends.
static VERSION_SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\(\d+\)$",
        r"[_\-\s]copy(\s*\d*)?$",
        r"[_\-\s]v\d+$",
        r"[_\-\s]final$",
        r"[_\-\s]draft$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static NON_WORD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^\w.\-]").ok());

/// Canonical form used for name-identity and fuzzy matching: lowercase,
/// whitespace collapsed to underscores, punctuation outside `[\w.-]`
/// stripped, trailing version suffixes removed (repeatedly, so
/// "report_final (2)" and "report" normalize alike).
pub fn normalize_name(name: &str) -> String {
    let (stem, extension) = split_extension(name);
    let mut stem = stem.trim().to_lowercase();

    loop {
        let before = stem.len();
        for regex in VERSION_SUFFIXES.iter() {
            stem = regex.replace(&stem, "").trim_end().to_string();
        }
        if stem.len() == before {
            break;
        }
    }

    let mut normalized = stem.replace(char::is_whitespace, "_");
    if let Some(non_word) = NON_WORD.as_ref() {
        normalized = non_word.replace_all(&normalized, "").into_owned();
    }
    match extension {
        Some(ext) => format!("{normalized}.{}", ext.to_lowercase()),
        None => normalized,
    }
}

/// Whether the raw name carries a version suffix.
pub fn matches_version_pattern(name: &str) -> bool {
    let (stem, _) = split_extension(name);
    let stem = stem.trim().to_lowercase();
    VERSION_SUFFIXES.iter().any(|regex| regex.is_match(&stem))
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => {
            (&name[..idx], Some(&name[idx + 1..]))
        }
        _ => (name, None),
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod normalize_tests;
