//! Shared deterministic types for the check-in core.
//!
//! These types define stable contracts between the engine, the safety scanner
//! and the record projection. They must not depend on external state or I/O.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation state. Ordered along the flow; `Safety` is the interrupt sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Intro,
    AskAge,
    AskBodyState,
    BreathingOffer,
    AskContext,
    AskFeelings,
    AskValues,
    AskPlanAction,
    AskPlanSupport,
    Done,
    Safety,
}

impl FlowState {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowState::Intro => "intro",
            FlowState::AskAge => "ask_age",
            FlowState::AskBodyState => "ask_body_state",
            FlowState::BreathingOffer => "breathing_offer",
            FlowState::AskContext => "ask_context",
            FlowState::AskFeelings => "ask_feelings",
            FlowState::AskValues => "ask_values",
            FlowState::AskPlanAction => "ask_plan_action",
            FlowState::AskPlanSupport => "ask_plan_support",
            FlowState::Done => "done",
            FlowState::Safety => "safety",
        }
    }

    /// Position along the linear flow. `Safety` sorts after everything.
    pub fn rank(self) -> u8 {
        match self {
            FlowState::Intro => 0,
            FlowState::AskAge => 1,
            FlowState::AskBodyState => 2,
            FlowState::BreathingOffer => 3,
            FlowState::AskContext => 4,
            FlowState::AskFeelings => 5,
            FlowState::AskValues => 6,
            FlowState::AskPlanAction => 7,
            FlowState::AskPlanSupport => 8,
            FlowState::Done => 9,
            FlowState::Safety => 10,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Done | FlowState::Safety)
    }
}

/// A fixed vocabulary of button options with stable ids and display labels.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    /// Stable option id used for button picks and storage.
    fn id(self) -> &'static str;

    /// Human-readable label.
    fn label(self) -> &'static str;

    fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.id().eq_ignore_ascii_case(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "k2")]
    K2,
    #[serde(rename = "3to5")]
    G3to5,
    #[serde(rename = "6to8")]
    G6to8,
}

impl Choice for AgeBand {
    const ALL: &'static [Self] = &[AgeBand::K2, AgeBand::G3to5, AgeBand::G6to8];

    fn id(self) -> &'static str {
        match self {
            AgeBand::K2 => "k2",
            AgeBand::G3to5 => "3to5",
            AgeBand::G6to8 => "6to8",
        }
    }

    fn label(self) -> &'static str {
        match self {
            AgeBand::K2 => "K–2",
            AgeBand::G3to5 => "3–5",
            AgeBand::G6to8 => "6–8",
        }
    }
}

/// How the body feels at check-in (the "pause" step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyState {
    FastBuzzy,
    SlowHeavy,
    CalmSteady,
}

impl Choice for BodyState {
    const ALL: &'static [Self] = &[
        BodyState::FastBuzzy,
        BodyState::SlowHeavy,
        BodyState::CalmSteady,
    ];

    fn id(self) -> &'static str {
        match self {
            BodyState::FastBuzzy => "fast_buzzy",
            BodyState::SlowHeavy => "slow_heavy",
            BodyState::CalmSteady => "calm_steady",
        }
    }

    fn label(self) -> &'static str {
        match self {
            BodyState::FastBuzzy => "Fast & buzzy",
            BodyState::SlowHeavy => "Slow & heavy",
            BodyState::CalmSteady => "Calm & steady",
        }
    }
}

impl BodyState {
    /// Regulation tip shown after the body check-in: `(title, instruction)`.
    pub fn tip(self) -> (&'static str, &'static str) {
        match self {
            BodyState::FastBuzzy => (
                "Blow out the candles",
                "Let’s try 3 slow breaths. In through your nose… and blow out like a candle. Make the exhale a little longer.",
            ),
            BodyState::SlowHeavy => (
                "Big stretch",
                "Let’s stand up and reach tall, then shake out hands and feet for 10 seconds. A little movement can wake the body.",
            ),
            BodyState::CalmSteady => (
                "Stay steady",
                "Hands on heart. Notice 3 things you can see, 2 you can hear, 1 you can feel. Nice and easy.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feeling {
    Angry,
    Sad,
    Worried,
    Frustrated,
    LeftOut,
    Okay,
    Better,
    Good,
}

impl Choice for Feeling {
    const ALL: &'static [Self] = &[
        Feeling::Angry,
        Feeling::Sad,
        Feeling::Worried,
        Feeling::Frustrated,
        Feeling::LeftOut,
        Feeling::Okay,
        Feeling::Better,
        Feeling::Good,
    ];

    fn id(self) -> &'static str {
        match self {
            Feeling::Angry => "angry",
            Feeling::Sad => "sad",
            Feeling::Worried => "worried",
            Feeling::Frustrated => "frustrated",
            Feeling::LeftOut => "left_out",
            Feeling::Okay => "okay",
            Feeling::Better => "better",
            Feeling::Good => "good",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Feeling::Angry => "Angry",
            Feeling::Sad => "Sad",
            Feeling::Worried => "Worried",
            Feeling::Frustrated => "Frustrated",
            Feeling::LeftOut => "Left out",
            Feeling::Okay => "Okay",
            Feeling::Better => "Better",
            Feeling::Good => "Good",
        }
    }
}

/// What matters most to the child in this moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreValue {
    Kindness,
    Fairness,
    Courage,
    Honesty,
    Caring,
    Learning,
}

impl Choice for CoreValue {
    const ALL: &'static [Self] = &[
        CoreValue::Kindness,
        CoreValue::Fairness,
        CoreValue::Courage,
        CoreValue::Honesty,
        CoreValue::Caring,
        CoreValue::Learning,
    ];

    fn id(self) -> &'static str {
        match self {
            CoreValue::Kindness => "kindness",
            CoreValue::Fairness => "fairness",
            CoreValue::Courage => "courage",
            CoreValue::Honesty => "honesty",
            CoreValue::Caring => "caring",
            CoreValue::Learning => "learning",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CoreValue::Kindness => "Kindness",
            CoreValue::Fairness => "Fairness",
            CoreValue::Courage => "Courage",
            CoreValue::Honesty => "Honesty",
            CoreValue::Caring => "Caring",
            CoreValue::Learning => "Learning",
        }
    }
}

/// Answer to the breathing offer. Not stored on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathingChoice {
    Start,
    Skip,
}

impl Choice for BreathingChoice {
    const ALL: &'static [Self] = &[BreathingChoice::Start, BreathingChoice::Skip];

    fn id(self) -> &'static str {
        match self {
            BreathingChoice::Start => "start_breathing",
            BreathingChoice::Skip => "skip_breathing",
        }
    }

    fn label(self) -> &'static str {
        match self {
            BreathingChoice::Start => "Start breathing",
            BreathingChoice::Skip => "Skip",
        }
    }
}

/// One raw user input event.
///
/// `Pick` carries button option ids and bypasses text normalization. `Text`
/// is whatever the child typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Input {
    Pick(Vec<String>),
    Text(String),
}

impl Input {
    pub fn pick(id: impl Into<String>) -> Self {
        Input::Pick(vec![id.into()])
    }

    pub fn text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }
}

/// Why the engine re-asked the current question instead of advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaskReason {
    UnrecognizedChoice,
    EmptyRequiredField,
}

/// One child's run through the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub student_id: Option<String>,
    pub state: FlowState,
    pub age_band: Option<AgeBand>,
    pub body_state: Option<BodyState>,
    pub context: String,
    pub feelings: Vec<Feeling>,
    pub value: Option<CoreValue>,
    pub plan_action: String,
    pub plan_support: String,
    pub commitment: Option<String>,
    /// Sticky: once set it is never cleared within the session.
    pub risk_flag: bool,
    pub risk_terms: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            student_id: None,
            state: FlowState::Intro,
            age_band: None,
            body_state: None,
            context: String::new(),
            feelings: Vec::new(),
            value: None,
            plan_action: String::new(),
            plan_support: String::new(),
            commitment: None,
            risk_flag: false,
            risk_terms: BTreeSet::new(),
            created_at,
            completed_at: None,
        }
    }

    /// Finished naturally with a committed plan.
    pub fn is_completed(&self) -> bool {
        self.state == FlowState::Done && !self.plan_action.is_empty()
    }

    /// Reached a terminal state (done or safety).
    pub fn is_finalized(&self) -> bool {
        self.state.is_terminal()
    }
}
