//! Core configuration
//!
//! Everything here has a working default, so an empty TOML file (or no file
//! at all) yields the stock layout:
//!
//! ```text
//! <data_dir>/logs/audit.log                       every audit entry
//! <data_dir>/logs/maintenance.log                 maintenance operations
//! <data_dir>/logs/truai-core.log                  core decision events
//! <data_dir>/artifacts/ai-history/ai-history-YYYY-MM-DD.json
//! <data_dir>/artifacts/metadata/<task_id>.json    per-task learning metadata
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt, TruAiError};

/// Environment variable pointing at a TOML configuration file
pub const CONFIG_ENV: &str = "TRUAI_CONFIG";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TRUAI_DATA_DIR";

/// Main core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Root directory all streams are resolved against
    pub data_dir: PathBuf,

    /// Audit stream locations
    pub streams: StreamSettings,

    /// Number of entries returned as "recent" by statistics
    pub recent_entries_limit: usize,

    /// Glob hints appended when a maintenance target names a subsystem
    pub subsystem_hints: Vec<SubsystemHint>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            streams: StreamSettings::default(),
            recent_entries_limit: 10,
            subsystem_hints: SubsystemHint::defaults(),
        }
    }
}

impl CoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set how many recent entries statistics report
    pub fn with_recent_entries_limit(mut self, limit: usize) -> Self {
        self.recent_entries_limit = limit;
        self
    }

    /// Replace the subsystem hint table
    pub fn with_subsystem_hints(mut self, hints: Vec<SubsystemHint>) -> Self {
        self.subsystem_hints = hints;
        self
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.streams.audit_log)
    }

    pub fn maintenance_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.streams.maintenance_log)
    }

    pub fn core_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.streams.core_log)
    }

    pub fn ai_history_dir(&self) -> PathBuf {
        self.data_dir.join(&self.streams.ai_history_dir)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.data_dir.join(&self.streams.metadata_dir)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(TruAiError::from)
            .with_context(|| format!("Reading configuration {}", path.display()))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a configuration from `TRUAI_CONFIG` and `TRUAI_DATA_DIR`
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir.trim());
            }
        }

        Ok(config)
    }

    /// Reject configurations that would make streams collide or vanish
    pub fn validate(&self) -> Result<()> {
        let streams = [
            ("audit_log", &self.streams.audit_log),
            ("maintenance_log", &self.streams.maintenance_log),
            ("core_log", &self.streams.core_log),
            ("ai_history_dir", &self.streams.ai_history_dir),
            ("metadata_dir", &self.streams.metadata_dir),
        ];

        for (name, path) in streams {
            if path.as_os_str().is_empty() {
                return Err(TruAiError::Config(format!("streams.{name} must not be empty")));
            }
        }

        if self.streams.audit_log == self.streams.maintenance_log {
            return Err(TruAiError::Config(
                "streams.audit_log and streams.maintenance_log must differ".to_string(),
            ));
        }

        if self
            .subsystem_hints
            .iter()
            .any(|hint| hint.keyword.trim().is_empty() || hint.glob.trim().is_empty())
        {
            return Err(TruAiError::Config(
                "subsystem hints need both a keyword and a glob".to_string(),
            ));
        }

        Ok(())
    }
}

/// Stream file locations, relative to the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub audit_log: PathBuf,
    pub maintenance_log: PathBuf,
    pub core_log: PathBuf,
    pub ai_history_dir: PathBuf,
    pub metadata_dir: PathBuf,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            audit_log: PathBuf::from("logs/audit.log"),
            maintenance_log: PathBuf::from("logs/maintenance.log"),
            core_log: PathBuf::from("logs/truai-core.log"),
            ai_history_dir: PathBuf::from("artifacts/ai-history"),
            metadata_dir: PathBuf::from("artifacts/metadata"),
        }
    }
}

/// A subsystem keyword and the file glob it implies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemHint {
    pub keyword: String,
    pub glob: String,
}

impl SubsystemHint {
    pub fn new(keyword: impl Into<String>, glob: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            glob: glob.into(),
        }
    }

    /// The stock hints: dashboard templates, workflow modules, documentation
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("dashboard", "phantom-ai/Templates/*.html"),
            Self::new("workflow", "phantom-ai/Workflow/*.php"),
            Self::new("documentation", "*.md"),
        ]
    }
}
