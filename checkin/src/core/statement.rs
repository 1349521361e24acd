//! Commitment statement built when the plan is complete.

use crate::core::types::{Choice, CoreValue};

const FALLBACK_CONTEXT: &str = "in tough moments";
const FALLBACK_ACTION: &str = "take one small, kind step";
const FALLBACK_VALUE: &str = "what matters to me";

/// Build the child's commitment line.
///
/// Output shape (em-dash included):
/// `When I feel this way when <context>, I will <action> — because <value> matters to me.`
///
/// Empty context uses "in tough moments". The value word is lowercased.
pub fn commitment_statement(context: &str, value: Option<CoreValue>, action: &str) -> String {
    let context = context.trim();
    let context_phrase = if context.is_empty() {
        FALLBACK_CONTEXT.to_string()
    } else {
        format!("when {context}")
    };
    let action = match action.trim() {
        "" => FALLBACK_ACTION,
        action => action,
    };
    let value_word = value
        .map(|value| value.label().to_lowercase())
        .unwrap_or_else(|| FALLBACK_VALUE.to_string());

    format!(
        "When I feel this way {context_phrase}, I will {action} — because {value_word} matters to me."
    )
}
