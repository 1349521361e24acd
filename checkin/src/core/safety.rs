//! Keyword safety scan over free text.
//!
//! Broad substring matching: a missed risk costs more than a false alarm, so
//! phrases match anywhere in the lowercased text, including inside words.
//! The list is fixed and auditable by school staff.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Risk phrases, lowercase. Matched as substrings of normalized input.
pub const RISK_TERMS: &[&str] = &[
    "kill myself",
    "want to die",
    "suicide",
    "hurt myself",
    "cut myself",
    "self-harm",
    "self harm",
    "unsafe at home",
    "they will hurt me",
    "someone will hurt me",
    "going to kill",
    "kill them",
    "i can't go on",
    "i cant go on",
    "cant go on",
    "no point",
    "worthless",
    "hopeless",
    "im in danger",
    "i'm in danger",
    "abuse",
];

/// Outcome of [`scan`]. `terms` is sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub flagged: bool,
    pub terms: BTreeSet<String>,
}

/// Scan `text` for risk phrases.
///
/// Empty or absent text is never flagged.
pub fn scan(text: Option<&str>) -> ScanResult {
    let Some(text) = text else {
        return ScanResult::default();
    };
    if text.trim().is_empty() {
        return ScanResult::default();
    }

    let normalized = normalize(text);
    let terms: BTreeSet<String> = RISK_TERMS
        .iter()
        .filter(|term| normalized.contains(**term))
        .map(|term| (*term).to_string())
        .collect();

    ScanResult {
        flagged: !terms.is_empty(),
        terms,
    }
}

/// Lowercase, fold typographic apostrophes, collapse whitespace runs.
fn normalize(text: &str) -> String {
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

    let lowered = text.to_lowercase().replace(['’', '‘'], "'");
    WHITESPACE_RE.replace_all(&lowered, " ").into_owned()
}
