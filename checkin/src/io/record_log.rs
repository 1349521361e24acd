//! Append-only session record log (`.checkin/sessions.jsonl`).
//!
//! One JSON object per line. Serde field order is the column order, so every
//! line lists columns identically. Records are never updated or deleted.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::record::SessionRecord;

/// Destination for finalized session records.
pub trait RecordSink {
    fn append(&self, record: &SessionRecord) -> Result<()>;
}

/// JSON-lines file sink.
#[derive(Debug, Clone)]
pub struct JsonlRecordLog {
    path: PathBuf,
}

impl JsonlRecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonlRecordLog {
    fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(record).context("serialize session record")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            risk_flag = record.risk_flag,
            "appended session record"
        );
        Ok(())
    }
}

/// Read every record in the log. A missing file is an empty log.
pub fn load_records(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), idx + 1))
        })
        .collect()
}
