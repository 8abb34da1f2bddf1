use anyhow::Context;
use mscript_link::{LinkSettings, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Protocol minimum between an error response and the next command.
pub(crate) const MIN_ERROR_SETTLE: Duration = Duration::from_millis(50);

/// Settings for one instrument session, usually loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_error_settle_ms")]
    pub error_settle_ms: u64,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_error_settle_ms() -> u64 {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            error_settle_ms: default_error_settle_ms(),
        }
    }
}

impl SessionConfig {
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// Delay after an error response, never below the protocol minimum.
    pub fn error_settle(&self) -> Duration {
        Duration::from_millis(self.error_settle_ms).max(MIN_ERROR_SETTLE)
    }
}

pub fn load_session_config(path: impl AsRef<Path>) -> anyhow::Result<SessionConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading session config: {}", path.display()))?;
    let config: SessionConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing yaml: {}", path.display()))?;
    Ok(config)
}
