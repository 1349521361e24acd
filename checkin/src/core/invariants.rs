//! Session invariants checked before a record is persisted.

use std::collections::HashSet;

use crate::core::types::{FlowState, Session};

/// Check session invariants:
/// - `done` sessions carry a non-empty plan action, a commitment and a completion time
/// - `safety` sessions carry the risk flag and at least one term
/// - the risk flag and the term set agree
/// - fields owned by states not yet reached are unset (non-safety sessions)
/// - feelings are unique
pub fn validate_session(session: &Session) -> Vec<String> {
    let mut errors = Vec::new();
    let state = session.state;

    if session.risk_flag != !session.risk_terms.is_empty() {
        errors.push(format!(
            "risk_flag={} disagrees with {} risk term(s)",
            session.risk_flag,
            session.risk_terms.len()
        ));
    }

    match state {
        FlowState::Done => {
            if session.plan_action.trim().is_empty() {
                errors.push("done: plan_action must be non-empty".to_string());
            }
            if session.commitment.is_none() {
                errors.push("done: commitment missing".to_string());
            }
            if session.completed_at.is_none() {
                errors.push("done: completed_at missing".to_string());
            }
        }
        FlowState::Safety => {
            if !session.risk_flag {
                errors.push("safety: risk_flag must be set".to_string());
            }
            if session.completed_at.is_none() {
                errors.push("safety: completed_at missing".to_string());
            }
        }
        _ => {}
    }

    if state != FlowState::Safety {
        let owned = [
            (FlowState::AskAge, session.age_band.is_some(), "age_band"),
            (FlowState::AskBodyState, session.body_state.is_some(), "body_state"),
            (FlowState::AskContext, !session.context.is_empty(), "context"),
            (FlowState::AskFeelings, !session.feelings.is_empty(), "feelings"),
            (FlowState::AskValues, session.value.is_some(), "value"),
            (FlowState::AskPlanAction, !session.plan_action.is_empty(), "plan_action"),
        ];
        for (owner, is_set, field) in owned {
            // A field must stay unset while the session is at or before its owner.
            if is_set && state.rank() <= owner.rank() {
                errors.push(format!("{}: {} set before it was asked", state.as_str(), field));
            }
        }
    }

    let mut seen = HashSet::new();
    for feeling in &session.feelings {
        if !seen.insert(feeling) {
            errors.push(format!("duplicate feeling {feeling:?}"));
        }
    }

    errors
}
