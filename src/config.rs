//! Engine configuration.
//!
//! Stored as JSON in the platform config directory
//! (`~/.config/cleanroom/config.json` on Linux). Every field has a default, so
//! a missing file or a partial file is fine.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the orchestrator does when a step fails with a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HaltPolicy {
    /// Stop at the first failed step
    #[default]
    Strict,

    /// Record the failure, keep the dataset unchanged and continue
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub halt_policy: HaltPolicy,
    /// Rows returned in a pipeline preview (default: 100)
    pub preview_row_limit: usize,
    /// Largest base dataset the engine accepts (default: 10000)
    pub max_rows: usize,
    /// Tokens the preprocessor treats as null, compared case-insensitively
    /// after trimming
    pub null_tokens: Vec<String>,
    /// How long a failed model load is remembered before a retry is allowed
    pub model_failure_window_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            halt_policy: HaltPolicy::Strict,
            preview_row_limit: 100,
            max_rows: 10_000,
            null_tokens: ["null", "none", "nan", "n/a", "na"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            model_failure_window_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Config with the lenient halt policy and otherwise default settings.
    pub fn lenient() -> Self {
        Self {
            halt_policy: HaltPolicy::Lenient,
            ..Self::default()
        }
    }

    pub fn model_failure_window(&self) -> Duration {
        Duration::from_secs(self.model_failure_window_secs)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("cleanroom").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON at {}", path.display()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
