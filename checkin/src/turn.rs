//! Orchestration for a single conversation turn.
//!
//! Runs the pure engine against a stored session and, on the turn that
//! finalizes it, projects and appends the record. Persistence failures are
//! reported in the [`TurnReport`] and never hide the child's plan.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::engine::{Engine, FlowSettings, Turn, TurnOutcome};
use crate::core::invariants::validate_session;
use crate::core::record::to_record;
use crate::core::responder::Responder;
use crate::core::types::{FlowState, Input, Session};
use crate::io::card::render_plan_card;
use crate::io::config::CheckinConfig;
use crate::io::record_log::RecordSink;
use crate::store::SessionStore;

/// Collaborators for running turns.
pub struct TurnContext<'a> {
    pub config: &'a CheckinConfig,
    pub sink: &'a dyn RecordSink,
    pub responder: Option<&'a dyn Responder>,
}

/// What happened to the record on a finalizing turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum PersistOutcome {
    Saved,
    /// Storage disabled for this kind of session.
    Skipped,
    Failed(String),
}

/// Result of one turn, ready for a UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub session_id: String,
    pub state: FlowState,
    pub prompts: Vec<String>,
    pub outcome: TurnOutcome,
    /// Set only on the finalizing turn.
    pub persisted: Option<PersistOutcome>,
    /// Plan card text, set when the session completes.
    pub card: Option<String>,
}

/// Greet a new (or restarted) session and ask its first question.
pub fn open_session(
    store: &mut SessionStore,
    session_id: &str,
    ctx: &TurnContext<'_>,
    now: DateTime<Utc>,
) -> Result<TurnReport> {
    let settings = ctx.config.flow_settings();
    let session = store.init(session_id, now);
    let turn = engine(&settings, ctx).open(session);
    Ok(report(session, turn, None, None))
}

/// Feed one input event to a stored session.
#[instrument(skip_all, fields(session_id = %session_id))]
pub fn run_turn(
    store: &mut SessionStore,
    session_id: &str,
    input: &Input,
    ctx: &TurnContext<'_>,
    now: DateTime<Utc>,
) -> Result<TurnReport> {
    let settings = ctx.config.flow_settings();
    let session = store
        .get_mut(session_id)
        .ok_or_else(|| anyhow!("unknown session {session_id}"))?;

    let from = session.state;
    let turn = engine(&settings, ctx).handle_input(session, input, now);
    debug!(from = from.as_str(), to = session.state.as_str(), "turn handled");

    if !turn.outcome.finalizes() {
        return Ok(report(session, turn, None, None));
    }

    let persisted = persist(session, ctx);
    let card = match &turn.outcome {
        TurnOutcome::Completed { .. } => match render_plan_card(session) {
            Ok(card) => Some(card),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "plan card render failed");
                None
            }
        },
        _ => None,
    };
    Ok(report(session, turn, Some(persisted), card))
}

fn engine<'a>(settings: &'a FlowSettings, ctx: &TurnContext<'a>) -> Engine<'a> {
    let engine = Engine::new(settings);
    match ctx.responder {
        Some(responder) => engine.with_responder(responder),
        None => engine,
    }
}

/// Project and append the record for a session that just finalized.
fn persist(session: &Session, ctx: &TurnContext<'_>) -> PersistOutcome {
    let config = ctx.config;
    let flagged = session.state == FlowState::Safety;
    if !config.save_records || (flagged && !config.persist_flagged_sessions) {
        info!(flagged, "record storage disabled, skipping");
        return PersistOutcome::Skipped;
    }

    let violations = validate_session(session);
    if !violations.is_empty() {
        warn!(violations = ?violations, "session invariants violated before persist");
    }

    let record = to_record(session);
    match ctx.sink.append(&record) {
        Ok(()) => {
            info!(flagged, "session record saved");
            PersistOutcome::Saved
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "session record append failed");
            PersistOutcome::Failed(message)
        }
    }
}

fn report(
    session: &Session,
    turn: Turn,
    persisted: Option<PersistOutcome>,
    card: Option<String>,
) -> TurnReport {
    TurnReport {
        session_id: session.id.clone(),
        state: session.state,
        prompts: turn.prompts,
        outcome: turn.outcome,
        persisted,
        card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingSink, MemorySink, ScriptedResponder, happy_path_inputs};

    fn drive(
        store: &mut SessionStore,
        id: &str,
        ctx: &TurnContext<'_>,
        inputs: &[Input],
    ) -> Vec<TurnReport> {
        let now = Utc::now();
        inputs
            .iter()
            .map(|input| run_turn(store, id, input, ctx, now).expect("turn"))
            .collect()
    }

    fn happy_path() -> Vec<Input> {
        let mut inputs = happy_path_inputs();
        inputs.pop();
        inputs.push(Input::text("my coach"));
        inputs
    }

    #[test]
    fn completed_session_is_saved_once_with_card() {
        let config = CheckinConfig::default();
        let sink = MemorySink::default();
        let ctx = TurnContext {
            config: &config,
            sink: &sink,
            responder: None,
        };
        let mut store = SessionStore::new();
        let id = store.create(Some("s-1".to_string()), Utc::now());
        open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

        let reports = drive(&mut store, &id, &ctx, &happy_path());
        let last = reports.last().expect("last report");
        assert_eq!(last.state, FlowState::Done);
        assert_eq!(last.persisted, Some(PersistOutcome::Saved));
        assert!(last.card.as_deref().unwrap_or_default().contains("Who can help: my coach"));
        assert!(reports[..reports.len() - 1].iter().all(|r| r.persisted.is_none()));

        // Further input after done does not persist again.
        drive(&mut store, &id, &ctx, &[Input::text("thanks")]);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_id, "s-1");
        assert!(!records[0].risk_flag);
    }

    #[test]
    fn persistence_failure_still_returns_plan() {
        let config = CheckinConfig::default();
        let sink = FailingSink;
        let ctx = TurnContext {
            config: &config,
            sink: &sink,
            responder: None,
        };
        let mut store = SessionStore::new();
        let id = store.create(None, Utc::now());
        open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

        let reports = drive(&mut store, &id, &ctx, &happy_path());
        let last = reports.last().expect("last report");
        assert!(matches!(last.persisted, Some(PersistOutcome::Failed(_))));
        assert!(matches!(last.outcome, TurnOutcome::Completed { .. }));
        assert!(last.card.is_some());
    }

    #[test]
    fn flagged_session_persistence_follows_config() {
        let config = CheckinConfig {
            persist_flagged_sessions: false,
            ..CheckinConfig::default()
        };
        let sink = MemorySink::default();
        let ctx = TurnContext {
            config: &config,
            sink: &sink,
            responder: None,
        };
        let mut store = SessionStore::new();
        let id = store.create(None, Utc::now());
        open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

        let reports = drive(&mut store, &id, &ctx, &[Input::text("i feel hopeless")]);
        assert_eq!(reports[0].state, FlowState::Safety);
        assert_eq!(reports[0].persisted, Some(PersistOutcome::Skipped));
        assert!(reports[0].card.is_none());
        assert!(sink.records().is_empty());
    }

    #[test]
    fn flagged_generated_reply_falls_back_to_fixed_line() {
        let config = CheckinConfig {
            offer_breathing: false,
            ..CheckinConfig::default()
        };
        let sink = MemorySink::default();
        let responder = ScriptedResponder::new(vec![Ok("you are worthless".to_string())]);
        let ctx = TurnContext {
            config: &config,
            sink: &sink,
            responder: Some(&responder),
        };
        let mut store = SessionStore::new();
        let id = store.create(None, Utc::now());
        open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

        let reports = drive(
            &mut store,
            &id,
            &ctx,
            &[Input::text("calm"), Input::text("we lost the game")],
        );
        let context_turn = &reports[1];
        assert_eq!(context_turn.state, FlowState::AskFeelings);
        assert_eq!(context_turn.prompts[0], "Thanks for trusting me with that.");
        assert_eq!(responder.seen(), vec![FlowState::AskContext]);
        let session = store.get(&id).expect("session");
        assert!(!session.risk_flag);
    }

    #[test]
    fn unknown_session_is_an_error() {
        let config = CheckinConfig::default();
        let sink = MemorySink::default();
        let ctx = TurnContext {
            config: &config,
            sink: &sink,
            responder: None,
        };
        let mut store = SessionStore::new();
        let err = run_turn(&mut store, "nope", &Input::text("hi"), &ctx, Utc::now())
            .expect_err("unknown");
        assert!(err.to_string().contains("unknown session"));
    }
}
