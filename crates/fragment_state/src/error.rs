//! Error types for fragment decoding, host adapters, and configuration loading.
//!
//! None of these surface through the navigation API: decode failures drop a single segment and
//! host failures degrade the notifier to a no-op. They exist so adapters and config loaders can
//! report what went wrong to logs and callers that opt in.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Percent-decoding failure for one fragment component.
pub enum DecodeError {
    /// A `%` escape was truncated or not followed by two hex digits.
    #[error("malformed percent escape at byte {offset}")]
    MalformedEscape {
        /// Byte offset of the offending `%` within the component.
        offset: usize,
    },
    /// The decoded bytes are not valid UTF-8.
    #[error("decoded component is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure reported by a host primitive adapter.
pub enum HostError {
    /// The host does not provide the requested primitive.
    #[error("host capability unavailable: {capability}")]
    Unavailable {
        /// Stable capability identifier used in diagnostics.
        capability: &'static str,
    },
    /// A DOM call failed while the primitive was being used.
    #[error("dom operation failed: {message}")]
    Dom {
        /// Host-provided failure detail.
        message: String,
    },
}

impl HostError {
    /// Builds a [`HostError::Dom`] from any displayable failure detail.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
/// Failure while loading a [`crate::HistoryConfig`].
pub enum ConfigError {
    /// The config document is not valid JSON for the config schema.
    #[error("invalid history config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The polling interval must be a positive number of milliseconds.
    #[error("poll interval must be greater than zero, got {0}ms")]
    InvalidPollInterval(u32),
}
