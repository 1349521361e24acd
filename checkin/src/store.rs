//! In-memory session store keyed by session id.
//!
//! Sessions live only in memory. `init` is the first-visit path, `reset` the
//! explicit restart for the next child. Callers pass the store explicitly;
//! there is no global.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use crate::core::types::Session;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: BTreeMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session under a fresh id and return the id.
    pub fn create(&mut self, student_id: Option<String>, now: DateTime<Utc>) -> String {
        let mut id = generate_session_id(now);
        while self.sessions.contains_key(&id) {
            id = generate_session_id(now);
        }
        let session = self.init(&id, now);
        session.student_id = student_id;
        id
    }

    /// Get the session for `id`, creating it at `intro` on first visit.
    pub fn init(&mut self, id: &str, now: DateTime<Utc>) -> &mut Session {
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = %id, "session created");
            Session::new(id, now)
        })
    }

    /// Discard the session and restart it at `intro` for the next child.
    ///
    /// Only the key survives; the student id is cleared. Returns `None` for
    /// unknown ids.
    pub fn reset(&mut self, id: &str, now: DateTime<Utc>) -> Option<&mut Session> {
        let session = self.sessions.get_mut(id)?;
        *session = Session::new(id, now);
        debug!(session_id = %id, "session reset");
        Some(session)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `ses-<yyyymmddHHMMSS>-<6 lowercase alphanumerics>`.
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase();
    format!("ses-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}
