use std::time::Duration;

use inkpad_core::EditorConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 800;
const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_MENTION_LIMIT: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Zero values fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub autosave_delay_ms: u64,
    #[serde(default)]
    pub completion_timeout_ms: u64,
    #[serde(default)]
    pub mention_limit: usize,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default().with_defaults()
    }

    pub fn with_defaults(mut self) -> Self {
        if self.autosave_delay_ms == 0 {
            self.autosave_delay_ms = DEFAULT_AUTOSAVE_DELAY_MS;
        }
        if self.completion_timeout_ms == 0 {
            self.completion_timeout_ms = DEFAULT_COMPLETION_TIMEOUT_MS;
        }
        if self.mention_limit == 0 {
            self.mention_limit = DEFAULT_MENTION_LIMIT;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}
