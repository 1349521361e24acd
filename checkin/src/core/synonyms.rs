//! Synonym tables mapping typed answers to fixed-choice tags.
//!
//! Matching is case-insensitive substring containment. Entries are checked in
//! table order, so earlier entries win for single-choice states. A tag may
//! appear in more than one entry to control precedence.

use crate::core::types::{AgeBand, BodyState, BreathingChoice, Choice, CoreValue, Feeling};

/// Ordered `(tag, synonyms)` pairs. Synonyms are lowercase.
pub struct SynonymTable<T: 'static> {
    entries: &'static [(T, &'static [&'static str])],
}

impl<T: Choice> SynonymTable<T> {
    pub const fn new(entries: &'static [(T, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// First tag whose synonym occurs in `text`.
    pub fn resolve(&self, text: &str) -> Option<T> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|s| lowered.contains(s)))
            .map(|(tag, _)| *tag)
    }

    /// Every tag with a synonym in `text`, deduplicated, in table order.
    pub fn resolve_all(&self, text: &str) -> Vec<T> {
        let lowered = text.to_lowercase();
        let mut tags = Vec::new();
        for (tag, synonyms) in self.entries {
            if !tags.contains(tag) && synonyms.iter().any(|s| lowered.contains(s)) {
                tags.push(*tag);
            }
        }
        tags
    }
}

/// Resolve a single button pick. Exactly one known id is required.
pub fn resolve_pick<T: Choice>(ids: &[String]) -> Option<T> {
    match ids {
        [id] => T::from_id(id),
        _ => None,
    }
}

/// Resolve a multi-select pick. Every id must be known; duplicates collapse.
pub fn resolve_picks<T: Choice>(ids: &[String]) -> Option<Vec<T>> {
    let mut tags = Vec::new();
    for id in ids {
        let tag = T::from_id(id)?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    (!tags.is_empty()).then_some(tags)
}

pub const AGE_BANDS: SynonymTable<AgeBand> = SynonymTable::new(&[
    (
        AgeBand::K2,
        &["k-2", "k–2", "k2", "kinder", "grade 1", "grade 2", "1st", "2nd"],
    ),
    (
        AgeBand::G3to5,
        &["3-5", "3–5", "grade 3", "grade 4", "grade 5", "3rd", "4th", "5th"],
    ),
    (
        AgeBand::G6to8,
        &[
            "6-8",
            "6–8",
            "grade 6",
            "grade 7",
            "grade 8",
            "6th",
            "7th",
            "8th",
            "middle school",
        ],
    ),
]);

pub const BODY_STATES: SynonymTable<BodyState> = SynonymTable::new(&[
    (BodyState::FastBuzzy, &["🏃", "buzzy", "fast"]),
    (BodyState::SlowHeavy, &["🐢", "slow", "heavy"]),
    (BodyState::CalmSteady, &["🌞", "calm", "steady"]),
]);

pub const FEELINGS: SynonymTable<Feeling> = SynonymTable::new(&[
    (Feeling::Angry, &["😡", "angry", "mad"]),
    (Feeling::Sad, &["😢", "sad"]),
    (Feeling::Worried, &["😟", "worried", "nervous", "scared"]),
    (Feeling::Frustrated, &["😤", "frustrated"]),
    (Feeling::LeftOut, &["😔", "left out", "lonely"]),
    (Feeling::Okay, &["😐", "okay"]),
    (Feeling::Better, &["🙂", "better"]),
    (Feeling::Good, &["😄", "good", "happy"]),
]);

pub const VALUES: SynonymTable<CoreValue> = SynonymTable::new(&[
    (CoreValue::Kindness, &["🤝", "kind"]),
    (CoreValue::Fairness, &["⚖", "fair"]),
    (CoreValue::Courage, &["💪", "courage", "brave"]),
    (CoreValue::Honesty, &["🗣", "honest", "truth"]),
    (CoreValue::Caring, &["❤", "caring", "care"]),
    (CoreValue::Learning, &["🧠", "learn"]),
]);

pub const BREATHING: SynonymTable<BreathingChoice> = SynonymTable::new(&[
    (
        BreathingChoice::Skip,
        &[
            "skip",
            "no thanks",
            "not now",
            "nope",
            "later",
            "not ok",
            "not sure",
        ],
    ),
    (
        BreathingChoice::Start,
        &["yes", "yeah", "yep", "sure", "start", "ready", "okay"],
    ),
    (BreathingChoice::Skip, &["no"]),
]);
