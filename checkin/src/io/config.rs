//! Check-in configuration stored under `.checkin/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::engine::FlowSettings;

/// Check-in configuration (TOML).
///
/// Edited by school staff. Missing fields default to the values below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckinConfig {
    /// Help/hotline text shown with the safety message.
    pub help_text: String,

    /// Ask for the age band before the body check-in.
    pub ask_age: bool,

    /// Offer paced breathing after the body check-in.
    pub offer_breathing: bool,

    /// In/out cycles in the breathing script (1..=10).
    pub breathing_cycles: u32,

    /// Append a record for each finished session.
    pub save_records: bool,

    /// Also append records for sessions ended by the safety scan.
    pub persist_flagged_sessions: bool,

    /// Record log path, relative to the project root unless absolute.
    pub record_log: PathBuf,

    /// Answer that leaves the support question empty.
    pub skip_word: String,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        let flow = FlowSettings::default();
        Self {
            help_text: flow.help_text,
            ask_age: flow.ask_age,
            offer_breathing: flow.offer_breathing,
            breathing_cycles: flow.breathing_cycles,
            save_records: true,
            persist_flagged_sessions: true,
            record_log: PathBuf::from(".checkin/sessions.jsonl"),
            skip_word: flow.skip_word,
        }
    }
}

impl CheckinConfig {
    pub fn validate(&self) -> Result<()> {
        if self.help_text.trim().is_empty() {
            return Err(anyhow!("help_text must be non-empty"));
        }
        if !(1..=10).contains(&self.breathing_cycles) {
            return Err(anyhow!("breathing_cycles must be between 1 and 10"));
        }
        if self.skip_word.trim().is_empty() {
            return Err(anyhow!("skip_word must be non-empty"));
        }
        if self.record_log.as_os_str().is_empty() {
            return Err(anyhow!("record_log must be a path"));
        }
        Ok(())
    }

    /// Engine settings derived from this config.
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            ask_age: self.ask_age,
            offer_breathing: self.offer_breathing,
            breathing_cycles: self.breathing_cycles,
            help_text: self.help_text.trim().to_string(),
            skip_word: self.skip_word.trim().to_string(),
        }
    }

    /// Resolve the record log path against `root`.
    pub fn record_log_path(&self, root: &Path) -> PathBuf {
        if self.record_log.is_absolute() {
            self.record_log.clone()
        } else {
            root.join(&self.record_log)
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CheckinConfig::default()`.
pub fn load_config(path: &Path) -> Result<CheckinConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = CheckinConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CheckinConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CheckinConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
