//! Conversation state machine.
//!
//! One input event per call. Every free-text input is safety-scanned before
//! the current state's own validation; a flagged scan moves the session to
//! [`FlowState::Safety`] from any non-terminal state. Unrecognized or empty
//! answers re-ask the current question without touching the session.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::prompts::{self, tone};
use crate::core::responder::{ReplyRequest, Responder, gated_reply};
use crate::core::safety::scan;
use crate::core::statement::commitment_statement;
use crate::core::synonyms::{
    AGE_BANDS, BODY_STATES, BREATHING, FEELINGS, VALUES, resolve_pick, resolve_picks,
};
use crate::core::types::{BreathingChoice, FlowState, Input, ReaskReason, Session};

/// Flow variant knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// Ask for the age band before the body check-in.
    pub ask_age: bool,
    /// Offer paced breathing after the body check-in.
    pub offer_breathing: bool,
    pub breathing_cycles: u32,
    /// Help/hotline text shown with the safety message.
    pub help_text: String,
    /// Answer that leaves `plan_support` empty.
    pub skip_word: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            ask_age: false,
            offer_breathing: true,
            breathing_cycles: 3,
            help_text: "If you need help now, tell a trusted adult or call/text 988 (US)."
                .to_string(),
            skip_word: "skip".to_string(),
        }
    }
}

/// What a single turn did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    Advanced { from: FlowState, to: FlowState },
    Reasked { reason: ReaskReason },
    /// Plan finished; the session is now `done`.
    Completed { statement: String },
    /// Safety interrupt fired; the session is now `safety`.
    SafetyStop { terms: BTreeSet<String> },
    /// Session was already terminal; nothing changed.
    Halted,
}

impl TurnOutcome {
    /// True on the one turn that moves a session into a terminal state.
    pub fn finalizes(&self) -> bool {
        matches!(
            self,
            TurnOutcome::Completed { .. } | TurnOutcome::SafetyStop { .. }
        )
    }
}

/// Prompts to show plus the turn outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub prompts: Vec<String>,
    pub outcome: TurnOutcome,
}

impl Turn {
    fn reask(prompt: Option<String>, reason: ReaskReason) -> Self {
        Self {
            prompts: prompt.into_iter().collect(),
            outcome: TurnOutcome::Reasked { reason },
        }
    }
}

pub struct Engine<'a> {
    settings: &'a FlowSettings,
    responder: Option<&'a dyn Responder>,
}

impl<'a> Engine<'a> {
    pub fn new(settings: &'a FlowSettings) -> Self {
        Self {
            settings,
            responder: None,
        }
    }

    pub fn with_responder(mut self, responder: &'a dyn Responder) -> Self {
        self.responder = Some(responder);
        self
    }

    /// First visit: greet and ask the first question.
    ///
    /// Only acts in `intro`; any other state re-asks its current question.
    pub fn open(&self, session: &mut Session) -> Turn {
        if session.state != FlowState::Intro {
            return Turn::reask(self.question(session), ReaskReason::UnrecognizedChoice);
        }
        let next = if self.settings.ask_age {
            FlowState::AskAge
        } else {
            FlowState::AskBodyState
        };
        let prompts = vec![prompts::GREETING.to_string()];
        self.advance(session, next, prompts)
    }

    /// Current question for the session's state, if it asks one.
    pub fn question(&self, session: &Session) -> Option<String> {
        let band = session.age_band;
        let question = match session.state {
            FlowState::Intro | FlowState::Done | FlowState::Safety => return None,
            FlowState::AskAge => prompts::AGE_QUESTION.to_string(),
            FlowState::AskBodyState => prompts::BODY_QUESTION.to_string(),
            FlowState::BreathingOffer => prompts::BREATHING_QUESTION.to_string(),
            FlowState::AskContext => tone(band).context_q.to_string(),
            FlowState::AskFeelings => prompts::feelings_question(band),
            FlowState::AskValues => prompts::values_question(band),
            FlowState::AskPlanAction => tone(band).plan_q.to_string(),
            FlowState::AskPlanSupport => prompts::support_question(&self.settings.skip_word),
        };
        Some(question)
    }

    /// Process one input event.
    pub fn handle_input(&self, session: &mut Session, input: &Input, now: DateTime<Utc>) -> Turn {
        match session.state {
            FlowState::Done => {
                return Turn {
                    prompts: Vec::new(),
                    outcome: TurnOutcome::Halted,
                };
            }
            FlowState::Safety => {
                return Turn {
                    prompts: self.safety_prompts(),
                    outcome: TurnOutcome::Halted,
                };
            }
            _ => {}
        }

        if let Input::Text(text) = input {
            let result = scan(Some(text));
            if result.flagged {
                return self.enter_safety(session, result.terms, now);
            }
        }

        match session.state {
            FlowState::Intro => self.open(session),
            FlowState::AskAge => self.on_age(session, input),
            FlowState::AskBodyState => self.on_body_state(session, input),
            FlowState::BreathingOffer => self.on_breathing(session, input),
            FlowState::AskContext => self.on_context(session, input),
            FlowState::AskFeelings => self.on_feelings(session, input),
            FlowState::AskValues => self.on_values(session, input),
            FlowState::AskPlanAction => self.on_plan_action(session, input),
            FlowState::AskPlanSupport => self.on_plan_support(session, input, now),
            FlowState::Done | FlowState::Safety => unreachable!("terminal states return early"),
        }
    }

    fn on_age(&self, session: &mut Session, input: &Input) -> Turn {
        let band = match input {
            Input::Pick(ids) => resolve_pick(ids),
            Input::Text(text) => AGE_BANDS.resolve(text),
        };
        let Some(band) = band else {
            return self.reask(session, ReaskReason::UnrecognizedChoice);
        };
        if session.age_band.is_none() {
            session.age_band = Some(band);
        }
        self.advance(session, FlowState::AskBodyState, Vec::new())
    }

    fn on_body_state(&self, session: &mut Session, input: &Input) -> Turn {
        let body_state = match input {
            Input::Pick(ids) => resolve_pick(ids),
            Input::Text(text) => BODY_STATES.resolve(text),
        };
        let Some(body_state) = body_state else {
            return self.reask(session, ReaskReason::UnrecognizedChoice);
        };
        session.body_state = Some(body_state);
        let next = if self.settings.offer_breathing {
            FlowState::BreathingOffer
        } else {
            FlowState::AskContext
        };
        self.advance(session, next, vec![prompts::body_ack(body_state)])
    }

    fn on_breathing(&self, session: &mut Session, input: &Input) -> Turn {
        let choice = match input {
            Input::Pick(ids) => resolve_pick(ids),
            Input::Text(text) => BREATHING.resolve(text),
        };
        let prompts = match choice {
            Some(BreathingChoice::Start) => {
                prompts::breathing_script(self.settings.breathing_cycles)
            }
            Some(BreathingChoice::Skip) => Vec::new(),
            None => return self.reask(session, ReaskReason::UnrecognizedChoice),
        };
        self.advance(session, FlowState::AskContext, prompts)
    }

    fn on_context(&self, session: &mut Session, input: &Input) -> Turn {
        let context = match open_text(input) {
            Ok(text) => text,
            Err(reason) => return self.reask(session, reason),
        };
        let ack = self.acknowledge(session, context, tone(session.age_band).context_ack);
        session.context = context.to_string();
        self.advance(session, FlowState::AskFeelings, vec![ack])
    }

    fn on_feelings(&self, session: &mut Session, input: &Input) -> Turn {
        let feelings = match input {
            Input::Pick(ids) => resolve_picks(ids).unwrap_or_default(),
            Input::Text(text) => FEELINGS.resolve_all(text),
        };
        if feelings.is_empty() {
            return self.reask(session, ReaskReason::UnrecognizedChoice);
        }
        let answer = input_text(input);
        let ack = self.acknowledge(session, &answer, prompts::FEELINGS_ACK);
        session.feelings = feelings;
        self.advance(session, FlowState::AskValues, vec![ack])
    }

    fn on_values(&self, session: &mut Session, input: &Input) -> Turn {
        let value = match input {
            Input::Pick(ids) => resolve_pick(ids),
            Input::Text(text) => VALUES.resolve(text),
        };
        let Some(value) = value else {
            return self.reask(session, ReaskReason::UnrecognizedChoice);
        };
        session.value = Some(value);
        self.advance(session, FlowState::AskPlanAction, vec![prompts::value_ack(value)])
    }

    fn on_plan_action(&self, session: &mut Session, input: &Input) -> Turn {
        let action = match open_text(input) {
            Ok(text) => text,
            Err(reason) => return self.reask(session, reason),
        };
        session.plan_action = action.to_string();
        self.advance(session, FlowState::AskPlanSupport, Vec::new())
    }

    fn on_plan_support(&self, session: &mut Session, input: &Input, now: DateTime<Utc>) -> Turn {
        let skip_word = self.settings.skip_word.as_str();
        let support = match input {
            Input::Pick(ids) if is_skip_pick(ids, skip_word) => "",
            _ => match open_text(input) {
                Ok(text) if text.eq_ignore_ascii_case(skip_word) => "",
                Ok(text) => text,
                Err(reason) => return self.reask(session, reason),
            },
        };
        session.plan_support = support.to_string();

        let statement =
            commitment_statement(&session.context, session.value, &session.plan_action);
        session.commitment = Some(statement.clone());
        session.state = FlowState::Done;
        session.completed_at = Some(now);

        Turn {
            prompts: vec![
                prompts::PLAN_ACK.to_string(),
                statement.clone(),
                prompts::CLOSING.to_string(),
            ],
            outcome: TurnOutcome::Completed { statement },
        }
    }

    fn enter_safety(
        &self,
        session: &mut Session,
        terms: BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Turn {
        session.risk_flag = true;
        session.risk_terms.extend(terms.iter().cloned());
        session.state = FlowState::Safety;
        session.completed_at = Some(now);
        Turn {
            prompts: self.safety_prompts(),
            outcome: TurnOutcome::SafetyStop { terms },
        }
    }

    fn safety_prompts(&self) -> Vec<String> {
        vec![
            prompts::SAFETY_MESSAGE.to_string(),
            self.settings.help_text.clone(),
        ]
    }

    /// Move to `next`, appending its question to `prompts`.
    fn advance(&self, session: &mut Session, next: FlowState, mut prompts: Vec<String>) -> Turn {
        let from = session.state;
        session.state = next;
        prompts.extend(self.question(session));
        Turn {
            prompts,
            outcome: TurnOutcome::Advanced { from, to: next },
        }
    }

    fn reask(&self, session: &Session, reason: ReaskReason) -> Turn {
        Turn::reask(self.question(session), reason)
    }

    fn acknowledge(&self, session: &Session, answer: &str, fallback: &str) -> String {
        let request = ReplyRequest {
            state: session.state,
            age_band: session.age_band,
            answer,
            fallback,
        };
        gated_reply(self.responder, &request)
            .text(&request)
            .to_string()
    }
}

/// Accept any non-empty free text, trimmed. Picks are not valid here.
fn open_text(input: &Input) -> Result<&str, ReaskReason> {
    match input {
        Input::Text(text) => match text.trim() {
            "" => Err(ReaskReason::EmptyRequiredField),
            text => Ok(text),
        },
        Input::Pick(_) => Err(ReaskReason::UnrecognizedChoice),
    }
}

fn is_skip_pick(ids: &[String], skip_word: &str) -> bool {
    matches!(ids, [id] if id.trim().eq_ignore_ascii_case(skip_word))
}

fn input_text(input: &Input) -> String {
    match input {
        Input::Text(text) => text.trim().to_string(),
        Input::Pick(ids) => ids.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgeBand, BodyState, CoreValue, Feeling};

    fn at(state: FlowState) -> Session {
        let mut session = Session::new("ses-test", Utc::now());
        session.state = state;
        session
    }

    #[test]
    fn open_greets_and_asks_body_state() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::Intro);

        let turn = engine.open(&mut session);
        assert_eq!(session.state, FlowState::AskBodyState);
        assert_eq!(turn.prompts[0], prompts::GREETING);
        assert_eq!(turn.prompts[1], prompts::BODY_QUESTION);
    }

    #[test]
    fn open_asks_age_when_enabled() {
        let settings = FlowSettings {
            ask_age: true,
            ..FlowSettings::default()
        };
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::Intro);
        engine.open(&mut session);
        assert_eq!(session.state, FlowState::AskAge);

        engine.handle_input(&mut session, &Input::pick("6to8"), Utc::now());
        assert_eq!(session.age_band, Some(AgeBand::G6to8));
        assert_eq!(session.state, FlowState::AskBodyState);
    }

    #[test]
    fn unrecognized_body_state_reasks_without_mutation() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::Intro);
        let opened = engine.open(&mut session);
        let before = session.clone();

        let turn = engine.handle_input(&mut session, &Input::text("purple"), Utc::now());
        assert_eq!(session, before);
        assert_eq!(
            turn.outcome,
            TurnOutcome::Reasked {
                reason: ReaskReason::UnrecognizedChoice
            }
        );
        assert_eq!(turn.prompts, vec![opened.prompts[1].clone()]);
    }

    #[test]
    fn body_state_pick_bypasses_synonyms() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskBodyState);

        let turn = engine.handle_input(&mut session, &Input::pick("calm_steady"), Utc::now());
        assert_eq!(session.body_state, Some(BodyState::CalmSteady));
        assert_eq!(session.state, FlowState::BreathingOffer);
        assert!(turn.prompts[0].contains("Stay steady"));
        assert_eq!(turn.prompts[1], prompts::BREATHING_QUESTION);
    }

    #[test]
    fn breathing_skipped_when_disabled() {
        let settings = FlowSettings {
            offer_breathing: false,
            ..FlowSettings::default()
        };
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskBodyState);
        engine.handle_input(&mut session, &Input::text("so slow"), Utc::now());
        assert_eq!(session.state, FlowState::AskContext);
    }

    #[test]
    fn breathing_start_emits_script_then_context_question() {
        let settings = FlowSettings {
            breathing_cycles: 1,
            ..FlowSettings::default()
        };
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::BreathingOffer);

        let turn = engine.handle_input(&mut session, &Input::text("yes!"), Utc::now());
        assert_eq!(session.state, FlowState::AskContext);
        assert_eq!(turn.prompts.len(), 4);
        assert_eq!(turn.prompts[2], prompts::BREATHING_DONE);
        assert_eq!(turn.prompts[3], tone(None).context_q);
    }

    #[test]
    fn empty_context_is_reasked() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskContext);

        let turn = engine.handle_input(&mut session, &Input::text("   "), Utc::now());
        assert_eq!(session.state, FlowState::AskContext);
        assert_eq!(
            turn.outcome,
            TurnOutcome::Reasked {
                reason: ReaskReason::EmptyRequiredField
            }
        );
    }

    #[test]
    fn risk_text_in_context_moves_to_safety() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskContext);
        session.body_state = Some(BodyState::FastBuzzy);

        let input = Input::text("I want to hurt myself");
        let turn = engine.handle_input(&mut session, &input, Utc::now());
        assert_eq!(session.state, FlowState::Safety);
        assert!(session.risk_flag);
        assert!(session.risk_terms.contains("hurt myself"));
        assert!(session.context.is_empty());
        assert_eq!(
            turn.prompts,
            vec![prompts::SAFETY_MESSAGE.to_string(), settings.help_text.clone()]
        );
        assert!(turn.outcome.finalizes());
    }

    #[test]
    fn safety_fires_from_fixed_choice_state_typed_text() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskBodyState);

        engine.handle_input(&mut session, &Input::text("fast, and i feel hopeless"), Utc::now());
        assert_eq!(session.state, FlowState::Safety);
        assert_eq!(session.body_state, None);
    }

    #[test]
    fn safety_state_only_repeats_help() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskContext);
        engine.handle_input(&mut session, &Input::text("I feel worthless"), Utc::now());
        let frozen = session.clone();

        let turn = engine.handle_input(&mut session, &Input::text("my toy got taken"), Utc::now());
        assert_eq!(session, frozen);
        assert_eq!(turn.outcome, TurnOutcome::Halted);
        assert_eq!(turn.prompts.len(), 2);
        assert_eq!(turn.prompts[1], settings.help_text);
    }

    #[test]
    fn feelings_accept_multi_pick_and_reject_unknown_ids() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskFeelings);

        let bad = Input::Pick(vec!["sad".to_string(), "purple".to_string()]);
        engine.handle_input(&mut session, &bad, Utc::now());
        assert!(session.feelings.is_empty());

        let good = Input::Pick(vec!["sad".to_string(), "worried".to_string()]);
        engine.handle_input(&mut session, &good, Utc::now());
        assert_eq!(session.feelings, vec![Feeling::Sad, Feeling::Worried]);
        assert_eq!(session.state, FlowState::AskValues);
    }

    #[test]
    fn support_skip_word_maps_to_empty_and_completes() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskPlanSupport);
        session.context = "a friend took my toy".to_string();
        session.value = Some(CoreValue::Kindness);
        session.plan_action = "ask for it back calmly".to_string();

        let now = Utc::now();
        let turn = engine.handle_input(&mut session, &Input::text(" SKIP "), now);
        assert_eq!(session.plan_support, "");
        assert_eq!(session.state, FlowState::Done);
        assert_eq!(session.completed_at, Some(now));
        let expected =
            "When I feel this way when a friend took my toy, I will ask for it back calmly — because kindness matters to me.";
        assert_eq!(
            turn.outcome,
            TurnOutcome::Completed {
                statement: expected.to_string()
            }
        );
        assert_eq!(session.commitment.as_deref(), Some(expected));
        assert!(turn.prompts.contains(&expected.to_string()));
    }

    #[test]
    fn done_session_ignores_input() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::Done);
        let turn = engine.handle_input(&mut session, &Input::text("hello?"), Utc::now());
        assert!(turn.prompts.is_empty());
        assert_eq!(turn.outcome, TurnOutcome::Halted);
        assert_eq!(session.state, FlowState::Done);
    }

    #[test]
    fn age_band_changes_question_tone() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskContext);
        session.age_band = Some(AgeBand::K2);
        assert_eq!(
            engine.question(&session).as_deref(),
            Some("I’m here with you. What happened?")
        );
    }

    #[test]
    fn age_band_tone_reaches_feelings_values_and_plan_questions() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let asked = |band: Option<AgeBand>, state: FlowState| {
            let mut session = at(state);
            session.age_band = band;
            engine.question(&session).expect("question")
        };

        let feelings = asked(Some(AgeBand::G6to8), FlowState::AskFeelings);
        assert!(feelings.starts_with("What feelings are here for you?"));
        assert!(feelings.ends_with(prompts::FEELINGS_OPTIONS));

        let values = asked(Some(AgeBand::K2), FlowState::AskValues);
        assert!(values.starts_with("What matters most: kind, fair, or brave?"));
        assert!(values.ends_with(prompts::VALUES_OPTIONS));

        assert_eq!(
            asked(Some(AgeBand::G3to5), FlowState::AskPlanAction),
            "What’s one small step you could try next that fits that?"
        );
        assert_eq!(asked(None, FlowState::AskPlanAction), tone(None).plan_q);
    }

    #[test]
    fn support_skip_pick_maps_to_empty() {
        let settings = FlowSettings::default();
        let engine = Engine::new(&settings);
        let mut session = at(FlowState::AskPlanSupport);
        session.plan_action = "take a break".to_string();

        let turn = engine.handle_input(&mut session, &Input::pick("Skip"), Utc::now());
        assert_eq!(session.plan_support, "");
        assert_eq!(session.state, FlowState::Done);
        assert!(matches!(turn.outcome, TurnOutcome::Completed { .. }));

        let mut other = at(FlowState::AskPlanSupport);
        other.plan_action = "take a break".to_string();
        let turn = engine.handle_input(
            &mut other,
            &Input::Pick(vec!["skip".to_string(), "mom".to_string()]),
            Utc::now(),
        );
        assert_eq!(
            turn.outcome,
            TurnOutcome::Reasked {
                reason: ReaskReason::UnrecognizedChoice
            }
        );
        assert_eq!(other.state, FlowState::AskPlanSupport);
    }
}
