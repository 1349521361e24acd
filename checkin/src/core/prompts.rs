//! Fixed prompt wording, with age-band tone variants.

use crate::core::types::{AgeBand, BodyState, Choice, CoreValue};

pub const GREETING: &str =
    "Hey, I’m here with you. Before we talk about what happened, let’s help your body feel okay.";

pub const AGE_QUESTION: &str =
    "Before we start, how old are you? This helps me talk in the best way for you.\n\n• K–2\n• 3–5\n• 6–8";

pub const BODY_QUESTION: &str =
    "How does your body feel right now?\n\n• 🏃 Fast & buzzy\n• 🐢 Slow & heavy\n• 🌞 Calm & steady\n\nYou can type one of these or pick a button.";

pub const BREATHING_QUESTION: &str =
    "Want to try some slow breathing together? Say yes to start, or skip to keep going.";

pub const BREATHING_DONE: &str = "Nice work. Let’s keep going.";

pub const FEELINGS_OPTIONS: &str =
    "😡 Angry • 😢 Sad • 😟 Worried • 😤 Frustrated • 😔 Left out • 😐 Okay • 🙂 Better • 😄 Good";

pub const VALUES_OPTIONS: &str =
    "🤝 Kindness • ⚖️ Fairness • 💪 Courage • 🗣 Honesty • ❤️ Caring • 🧠 Learning";

pub const FEELINGS_ACK: &str = "Yeah, that makes sense. Those feelings are real.";

pub const PLAN_ACK: &str = "That’s a solid plan. I like how it sounds just like you.";

pub const CLOSING: &str = "Proud of you for making a choice that matches your best self.";

pub const SAFETY_MESSAGE: &str =
    "That sounds really serious. I’m glad you told me.\nYou matter a lot, and you deserve to feel safe.\nLet’s get you to a person who can help right now.";

/// Wording that changes with the child's age band.
#[derive(Debug)]
pub struct Tone {
    pub context_q: &'static str,
    pub context_ack: &'static str,
    pub feelings_q: &'static str,
    pub values_q: &'static str,
    pub plan_q: &'static str,
}

const DEFAULT_TONE: Tone = Tone {
    context_q: "When you’re ready, tell me what happened. Just say it like you’d tell a friend.",
    context_ack: "Thanks for trusting me with that.",
    feelings_q: "What are you feeling right now? You can pick more than one:",
    values_q: "What matters most to you here? Pick one:",
    plan_q: "Think about the kind of person you want to be. What’s one small thing you could do right now that fits that?",
};

const K2_TONE: Tone = Tone {
    context_q: "I’m here with you. What happened?",
    context_ack: "Thanks for telling me. I’m right here with you.",
    feelings_q: "How do you feel? Mad, sad, or something else?",
    values_q: "What matters most: kind, fair, or brave?",
    plan_q: "What is one small thing you can try now?",
};

const G3TO5_TONE: Tone = Tone {
    context_q: "Thanks for telling me. What went down?",
    context_ack: "That makes sense. I hear you.",
    feelings_q: "How are you feeling right now? (mad, sad, left out, worried, or something else)",
    values_q: "What matters most here: kindness, fairness, honesty, courage, or caring?",
    plan_q: "What’s one small step you could try next that fits that?",
};

const G6TO8_TONE: Tone = Tone {
    context_q: "I’m listening. What happened?",
    context_ack: "Yeah, that tracks. Thanks for being honest.",
    feelings_q: "What feelings are here for you? (angry, sad, hurt, worried, frustrated, etc.)",
    values_q: "What matters most to you in this: kindness, fairness, honesty, courage, caring, or learning?",
    plan_q: "Thinking about the person you want to be, what’s one next step you’d be proud of?",
};

pub fn tone(band: Option<AgeBand>) -> &'static Tone {
    match band {
        None => &DEFAULT_TONE,
        Some(AgeBand::K2) => &K2_TONE,
        Some(AgeBand::G3to5) => &G3TO5_TONE,
        Some(AgeBand::G6to8) => &G6TO8_TONE,
    }
}

pub fn feelings_question(band: Option<AgeBand>) -> String {
    format!("{}\n\n{}", tone(band).feelings_q, FEELINGS_OPTIONS)
}

pub fn values_question(band: Option<AgeBand>) -> String {
    format!("{}\n\n{}", tone(band).values_q, VALUES_OPTIONS)
}

pub fn body_ack(state: BodyState) -> String {
    let (title, tip) = state.tip();
    format!("Thanks for sharing. {title}:\n\n{tip}")
}

pub fn value_ack(value: CoreValue) -> String {
    format!("Got it. {} matters to you — I can see why.", value.label())
}

pub fn support_question(skip_word: &str) -> String {
    format!(
        "Nice. Is there someone who could help you with this? (friend, teacher, family) You can say {skip_word} if you want."
    )
}

/// Paced breathing lines: `cycles` in/out pairs followed by a wrap-up line.
pub fn breathing_script(cycles: u32) -> Vec<String> {
    let mut lines = Vec::with_capacity(cycles as usize * 2 + 1);
    for _ in 0..cycles {
        lines.push("Breathe in… 1, 2, 3.".to_string());
        lines.push("Breathe out… 1, 2, 3, 4.".to_string());
    }
    lines.push(BREATHING_DONE.to_string());
    lines
}
