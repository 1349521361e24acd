//! Test-only helpers: scripted collaborators and session builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::core::record::SessionRecord;
use crate::core::responder::{ReplyRequest, Responder};
use crate::core::types::{FlowState, Input, Session};
use crate::io::config::{CheckinConfig, write_config};
use crate::io::init::{CheckinPaths, InitOptions, init_checkin};
use crate::io::record_log::RecordSink;

/// Record sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RefCell<Vec<SessionRecord>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.borrow().clone()
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: &SessionRecord) -> Result<()> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}

/// Record sink whose appends always fail.
#[derive(Debug, Default)]
pub struct FailingSink;

impl RecordSink for FailingSink {
    fn append(&self, _record: &SessionRecord) -> Result<()> {
        Err(anyhow!("disk full"))
    }
}

/// Responder that replays queued replies, then errors once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    replies: RefCell<VecDeque<Result<String, String>>>,
    seen: RefCell<Vec<FlowState>>,
}

impl ScriptedResponder {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// States the responder was asked about, in call order.
    pub fn seen(&self) -> Vec<FlowState> {
        self.seen.borrow().clone()
    }
}

impl Responder for ScriptedResponder {
    fn generate(&self, request: &ReplyRequest<'_>) -> Result<String, String> {
        self.seen.borrow_mut().push(request.state);
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply left".to_string()))
    }
}

/// Session at `state` with a fixed creation time and no fields set.
pub fn session_at(state: FlowState) -> Session {
    let created = Utc
        .with_ymd_and_hms(2025, 1, 6, 10, 0, 0)
        .single()
        .expect("valid fixed timestamp");
    let mut session = Session::new("ses-fixture", created);
    session.state = state;
    session
}

/// Typed answers that walk a default-config session from `ask_body_state` to `done`.
pub fn happy_path_inputs() -> Vec<Input> {
    vec![
        Input::text("fast and buzzy"),
        Input::text("skip"),
        Input::text("a friend took my toy"),
        Input::text("mad and sad"),
        Input::text("kindness"),
        Input::text("ask for it back calmly"),
        Input::text("skip"),
    ]
}

/// Temporary project root with `.checkin/` initialized.
pub struct TestProject {
    dir: TempDir,
    paths: CheckinPaths,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let paths = init_checkin(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir, paths })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &CheckinPaths {
        &self.paths
    }

    pub fn write_config(&self, config: &CheckinConfig) -> Result<()> {
        write_config(&self.paths.config_path, config)
    }
}
