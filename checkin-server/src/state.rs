//! Shared application state for the check-in server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use checkin::io::config::{CheckinConfig, load_config};
use checkin::io::init::CheckinPaths;
use checkin::io::record_log::JsonlRecordLog;
use checkin::store::SessionStore;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Root directory of the project (contains .checkin/).
    pub project_dir: PathBuf,
    pub config: Arc<CheckinConfig>,
    /// Append-only record log resolved from the config.
    pub record_log: Arc<JsonlRecordLog>,
    /// Live sessions. One lock per turn; turns on a session never overlap.
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    /// Load `.checkin/config.toml` under `project_dir` (defaults if missing).
    pub fn load(project_dir: PathBuf) -> Result<Self> {
        let config = load_config(&CheckinPaths::new(&project_dir).config_path)?;
        Ok(Self::with_config(project_dir, config))
    }

    pub fn with_config(project_dir: PathBuf, config: CheckinConfig) -> Self {
        let record_log = JsonlRecordLog::new(config.record_log_path(&project_dir));
        Self {
            project_dir,
            config: Arc::new(config),
            record_log: Arc::new(record_log),
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }
}
