//! Initialization helpers for `.checkin/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{CheckinConfig, write_config};

const CHECKIN_GITIGNORE: &str = "# Session records may identify students.\nsessions.jsonl\n";

/// Canonical paths within `.checkin/` for a project root.
#[derive(Debug, Clone)]
pub struct CheckinPaths {
    pub root: PathBuf,
    pub checkin_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
}

impl CheckinPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let checkin_dir = root.join(".checkin");
        Self {
            root: root.clone(),
            checkin_dir: checkin_dir.clone(),
            gitignore_path: checkin_dir.join(".gitignore"),
            config_path: checkin_dir.join("config.toml"),
        }
    }
}

/// Options for `init_checkin`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing files.
    pub force: bool,
}

/// Create `.checkin/` with a default config in `root`.
///
/// Fails if a config already exists unless `options.force` is set.
pub fn init_checkin(root: &Path, options: &InitOptions) -> Result<CheckinPaths> {
    let paths = CheckinPaths::new(root);
    if paths.checkin_dir.exists() && !paths.checkin_dir.is_dir() {
        return Err(anyhow!("checkin init: .checkin exists but is not a directory"));
    }
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "checkin init: {} already exists (use --force to overwrite)",
            paths.config_path.display()
        ));
    }

    fs::create_dir_all(&paths.checkin_dir)
        .with_context(|| format!("create directory {}", paths.checkin_dir.display()))?;
    fs::write(&paths.gitignore_path, CHECKIN_GITIGNORE)
        .with_context(|| format!("write {}", paths.gitignore_path.display()))?;
    write_config(&paths.config_path, &CheckinConfig::default())?;

    info!(config = %paths.config_path.display(), "initialized check-in config");
    Ok(paths)
}
