//! History engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Polling interval used when no config overrides it.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Which change-notification strategy to use.
pub enum ModePreference {
    /// Follow the host capability probe.
    #[default]
    Auto,
    /// Always subscribe to native change events.
    Native,
    /// Always poll against a shadow context.
    Polling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Tunables for [`crate::FragmentHistory`].
pub struct HistoryConfig {
    /// Delay between polling ticks in milliseconds.
    pub poll_interval_ms: u32,
    /// Change-notification strategy preference.
    pub mode: ModePreference,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            mode: ModePreference::Auto,
        }
    }
}

impl HistoryConfig {
    /// Parses and validates a JSON config document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a zero polling interval.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error when the polling interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(self.poll_interval_ms));
        }
        Ok(())
    }

    /// Polling interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }
}
