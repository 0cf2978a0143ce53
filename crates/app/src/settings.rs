use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{LevelFilter, warn};

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// File the store is loaded from and saved to. Nothing is persisted if unset.
    pub snapshot_path: Option<PathBuf>,
    pub log_level: String,
    /// Number of log entries kept in memory.
    pub log_capacity: usize,
}

impl Settings {
    /// Reads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings in {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!("invalid log level \"{}\"", self.log_level);
            LevelFilter::Info
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            log_level: String::from("info"),
            log_capacity: 100,
        }
    }
}
