//! "My Next Step" plan card rendered for the child to keep.

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};

use crate::core::record::TIMESTAMP_FORMAT;
use crate::core::types::{Choice, Session};

const PLAN_CARD_TEMPLATE: &str = include_str!("templates/plan_card.txt");
const EMPTY_FIELD: &str = "—";

/// Template engine wrapper around minijinja.
struct CardEngine {
    env: Environment<'static>,
}

impl CardEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("plan_card.txt", PLAN_CARD_TEMPLATE)
            .context("load plan card template")?;
        Ok(Self { env })
    }

    fn render(&self, session: &Session, plan: &str) -> Result<String> {
        let feelings = session
            .feelings
            .iter()
            .map(|feeling| feeling.label())
            .collect::<Vec<_>>()
            .join(", ");
        let feelings = if feelings.is_empty() {
            EMPTY_FIELD.to_string()
        } else {
            feelings
        };
        let time = session
            .completed_at
            .unwrap_or(session.created_at)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let template = self.env.get_template("plan_card.txt")?;
        let rendered = template.render(context! {
            time => time,
            feelings => feelings,
            value => session.value.map(|value| value.label()).unwrap_or(EMPTY_FIELD),
            plan => plan,
            support => (!session.plan_support.is_empty()).then_some(session.plan_support.as_str()),
        })?;
        Ok(rendered)
    }
}

/// Render the plan card for a completed session.
pub fn render_plan_card(session: &Session) -> Result<String> {
    let plan = session
        .commitment
        .as_deref()
        .ok_or_else(|| anyhow!("session {} has no commitment to render", session.id))?;
    CardEngine::new()?.render(session, plan)
}
