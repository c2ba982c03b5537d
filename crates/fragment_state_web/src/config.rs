//! Optional `localStorage` override for [`HistoryConfig`].
//!
//! Lets a deployment flip the notifier mode or polling interval without a rebuild. Missing or
//! invalid documents fall back to defaults.

use fragment_state::{ConfigError, HistoryConfig};
use tracing::warn;

/// `localStorage` key holding the JSON config document.
pub const CONFIG_STORAGE_KEY: &str = "fragment_state.config";

#[derive(Debug, Clone, Copy, Default)]
/// Reads [`HistoryConfig`] from `window.localStorage`.
pub struct WebConfigSource;

impl WebConfigSource {
    /// Loads the raw JSON config document.
    pub fn load_json(self) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()?.local_storage().ok().flatten()?;
            storage.get_item(CONFIG_STORAGE_KEY).ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    /// Loads and validates the stored config.
    ///
    /// # Errors
    ///
    /// Returns an error when a stored document exists but is invalid.
    pub fn try_load(self) -> Result<Option<HistoryConfig>, ConfigError> {
        self.load_json()
            .map(|raw| HistoryConfig::from_json_str(&raw))
            .transpose()
    }

    /// Loads the stored config, falling back to defaults.
    pub fn load_or_default(self) -> HistoryConfig {
        match self.try_load() {
            Ok(config) => config.unwrap_or_default(),
            Err(err) => {
                warn!(%err, key = CONFIG_STORAGE_KEY, "ignoring stored history config");
                HistoryConfig::default()
            }
        }
    }
}
