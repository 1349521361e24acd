//! End-to-end check-in flows driven through the library.
//!
//! Each test runs a session from `intro` through the store and turn runner,
//! with records written to a real JSONL log inside a temp project.

use chrono::Utc;

use checkin::core::engine::{Engine, FlowSettings, TurnOutcome};
use checkin::core::prompts::BODY_QUESTION;
use checkin::core::types::{BodyState, CoreValue, Feeling, FlowState, Input, ReaskReason};
use checkin::io::config::{CheckinConfig, load_config};
use checkin::io::record_log::{JsonlRecordLog, load_records};
use checkin::store::SessionStore;
use checkin::test_support::{TestProject, happy_path_inputs, session_at};
use checkin::turn::{PersistOutcome, TurnContext, TurnReport, open_session, run_turn};

fn run_all(
    store: &mut SessionStore,
    id: &str,
    ctx: &TurnContext<'_>,
    inputs: &[Input],
) -> Vec<TurnReport> {
    inputs
        .iter()
        .map(|input| run_turn(store, id, input, ctx, Utc::now()).expect("turn"))
        .collect()
}

#[test]
fn typed_session_completes_and_is_logged_once() {
    let project = TestProject::new().expect("project");
    let config = load_config(&project.paths().config_path).expect("config");
    let sink = JsonlRecordLog::new(config.record_log_path(project.path()));
    let ctx = TurnContext {
        config: &config,
        sink: &sink,
        responder: None,
    };
    let mut store = SessionStore::new();
    let id = store.create(Some("stu-42".to_string()), Utc::now());

    let opened = open_session(&mut store, &id, &ctx, Utc::now()).expect("open");
    assert_eq!(opened.state, FlowState::AskBodyState);
    assert_eq!(opened.prompts.last().map(String::as_str), Some(BODY_QUESTION));

    let reports = run_all(&mut store, &id, &ctx, &happy_path_inputs());
    let last = reports.last().expect("reports");
    assert_eq!(last.state, FlowState::Done);
    assert_eq!(last.persisted, Some(PersistOutcome::Saved));
    let statement =
        "When I feel this way when a friend took my toy, I will ask for it back calmly — because kindness matters to me.";
    assert!(last.prompts.iter().any(|p| p == statement));

    let session = store.get(&id).expect("session");
    assert_eq!(session.body_state, Some(BodyState::FastBuzzy));
    assert_eq!(session.feelings, vec![Feeling::Angry, Feeling::Sad]);
    assert_eq!(session.value, Some(CoreValue::Kindness));
    assert_eq!(session.plan_support, "");
    assert!(!session.plan_action.is_empty());

    let records = load_records(sink.path()).expect("records");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.student_id, "stu-42");
    assert_eq!(record.polyvagal_state, "Fast & buzzy");
    assert_eq!(record.feelings, "Angry, Sad");
    assert_eq!(record.mood, record.feelings);
    assert_eq!(record.values, "Kindness");
    assert_eq!(record.what_happened, "a friend took my toy");
    assert_eq!(record.plan_support, "");
    assert!(!record.risk_flag);
    assert_eq!(record.risk_terms, "");
}

#[test]
fn safety_is_sticky_and_logged_with_terms() {
    let project = TestProject::new().expect("project");
    let config = load_config(&project.paths().config_path).expect("config");
    let sink = JsonlRecordLog::new(config.record_log_path(project.path()));
    let ctx = TurnContext {
        config: &config,
        sink: &sink,
        responder: None,
    };
    let mut store = SessionStore::new();
    let id = store.create(None, Utc::now());
    open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

    let reports = run_all(
        &mut store,
        &id,
        &ctx,
        &[
            Input::pick("calm_steady"),
            Input::pick("skip_breathing"),
            Input::text("I want to hurt myself"),
            Input::text("never mind, kindness"),
            Input::pick("kindness"),
        ],
    );
    assert!(matches!(reports[2].outcome, TurnOutcome::SafetyStop { .. }));
    for report in &reports[3..] {
        assert_eq!(report.state, FlowState::Safety);
        assert_eq!(report.outcome, TurnOutcome::Halted);
        assert!(report.persisted.is_none());
    }

    let session = store.get(&id).expect("session");
    assert!(session.risk_flag);
    assert!(session.context.is_empty());
    assert!(session.value.is_none());

    let records = load_records(sink.path()).expect("records");
    assert_eq!(records.len(), 1);
    assert!(records[0].risk_flag);
    assert_eq!(records[0].risk_terms, "hurt myself");
    assert_eq!(records[0].polyvagal_state, "Calm & steady");
}

#[test]
fn unrecognized_body_state_reasks_without_mutation() {
    let settings = FlowSettings::default();
    let engine = Engine::new(&settings);
    let mut session = session_at(FlowState::AskBodyState);
    let before = session.clone();

    let turn = engine.handle_input(&mut session, &Input::text("purple"), Utc::now());
    assert_eq!(
        turn.outcome,
        TurnOutcome::Reasked {
            reason: ReaskReason::UnrecognizedChoice
        }
    );
    assert_eq!(turn.prompts, vec![BODY_QUESTION.to_string()]);
    assert_eq!(session, before);
}

#[test]
fn reset_restarts_a_finished_session() {
    let project = TestProject::new().expect("project");
    let config = CheckinConfig {
        save_records: false,
        ..CheckinConfig::default()
    };
    project.write_config(&config).expect("write config");
    let config = load_config(&project.paths().config_path).expect("config");
    let sink = JsonlRecordLog::new(config.record_log_path(project.path()));
    let ctx = TurnContext {
        config: &config,
        sink: &sink,
        responder: None,
    };
    let mut store = SessionStore::new();
    let id = store.create(Some("stu-1".to_string()), Utc::now());
    open_session(&mut store, &id, &ctx, Utc::now()).expect("open");

    let reports = run_all(&mut store, &id, &ctx, &[Input::text("no point trying")]);
    assert_eq!(reports[0].persisted, Some(PersistOutcome::Skipped));

    store.reset(&id, Utc::now()).expect("reset");
    let reopened = open_session(&mut store, &id, &ctx, Utc::now()).expect("reopen");
    assert_eq!(reopened.state, FlowState::AskBodyState);
    let session = store.get(&id).expect("session");
    assert!(!session.risk_flag);
    assert_eq!(session.student_id, None);
    assert!(load_records(sink.path()).expect("records").is_empty());
}

#[test]
fn next_child_after_reset_is_not_logged_under_previous_id() {
    let project = TestProject::new().expect("project");
    let config = load_config(&project.paths().config_path).expect("config");
    let sink = JsonlRecordLog::new(config.record_log_path(project.path()));
    let ctx = TurnContext {
        config: &config,
        sink: &sink,
        responder: None,
    };
    let mut store = SessionStore::new();
    let id = store.create(Some("stu-A".to_string()), Utc::now());
    open_session(&mut store, &id, &ctx, Utc::now()).expect("open");
    run_all(&mut store, &id, &ctx, &happy_path_inputs()[..3]);

    store.reset(&id, Utc::now()).expect("reset");
    open_session(&mut store, &id, &ctx, Utc::now()).expect("reopen");
    let reports = run_all(&mut store, &id, &ctx, &happy_path_inputs());
    assert_eq!(reports.last().map(|r| r.state), Some(FlowState::Done));

    let records = load_records(sink.path()).expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].student_id, "");
}
