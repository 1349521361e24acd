//! Flattened, persisted snapshot of a finalized session.

use serde::{Deserialize, Serialize};

use crate::core::types::{Choice, Session};

/// Timestamp layout used in stored records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the append-only session log.
///
/// Field order is the column order and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub timestamp: String,
    pub student_id: String,
    pub polyvagal_state: String,
    pub mood: String,
    pub context: String,
    pub feelings: String,
    pub values: String,
    pub what_happened: String,
    pub plan_action: String,
    pub plan_support: String,
    pub risk_flag: bool,
    pub risk_terms: String,
}

/// Column names in stored order.
pub const COLUMNS: [&str; 12] = [
    "timestamp",
    "student_id",
    "polyvagal_state",
    "mood",
    "context",
    "feelings",
    "values",
    "what_happened",
    "plan_action",
    "plan_support",
    "risk_flag",
    "risk_terms",
];

/// Project a session into its stored shape.
///
/// The timestamp is the completion time, or creation time for a session
/// that never finished.
pub fn to_record(session: &Session) -> SessionRecord {
    let timestamp = session
        .completed_at
        .unwrap_or(session.created_at)
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let feelings = session
        .feelings
        .iter()
        .map(|feeling| feeling.label())
        .collect::<Vec<_>>()
        .join(", ");
    let risk_terms = session
        .risk_terms
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    SessionRecord {
        timestamp,
        student_id: session.student_id.clone().unwrap_or_default(),
        polyvagal_state: session
            .body_state
            .map(|state| state.label().to_string())
            .unwrap_or_default(),
        mood: feelings.clone(),
        context: session.context.clone(),
        feelings,
        values: session
            .value
            .map(|value| value.label().to_string())
            .unwrap_or_default(),
        what_happened: session.context.clone(),
        plan_action: session.plan_action.clone(),
        plan_support: session.plan_support.clone(),
        risk_flag: session.risk_flag,
        risk_terms,
    }
}
