//! Controller configuration passed in from the host page as JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilecrop_core::{BackendConfig, CaptureConfig, ConfigError};
use tilecrop_io::InterceptConfig;

/// Everything the controller can be configured with.
///
/// Every field is optional in the JSON form; missing fields take the
/// defaults of the public backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Backend URL layout and tile size.
    pub backend: BackendConfig,

    /// How long a click waits for the page's pixel query, in ms.
    pub grace_interval_ms: Option<u64>,

    /// How often the wait checks for an observation, in ms.
    pub poll_interval_ms: Option<u64>,

    /// Request hook maintenance.
    pub intercept: InterceptConfig,

    /// `tracing` filter directive for console output.
    pub log_filter: Option<String>,
}

/// Errors from parsing a [`WebConfig`].
#[derive(Debug, thiserror::Error)]
pub enum WebConfigError {
    /// The JSON could not be parsed.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The parsed backend settings are unusable.
    #[error(transparent)]
    Backend(#[from] ConfigError),
}

impl WebConfig {
    /// Parse and validate a JSON config. `None` or an empty string yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`WebConfigError`] for malformed JSON or invalid values.
    pub fn from_json(json: Option<&str>) -> Result<Self, WebConfigError> {
        let config: Self = match json.map(str::trim) {
            None | Some("") => Self::default(),
            Some(json) => serde_json::from_str(json)?,
        };
        config.backend.validate()?;
        Ok(config)
    }

    /// Capture timing, with defaults filled in.
    #[must_use]
    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            grace_interval: self
                .grace_interval_ms
                .map_or(CaptureConfig::DEFAULT_GRACE_INTERVAL, Duration::from_millis),
            poll_interval: self
                .poll_interval_ms
                .map_or(CaptureConfig::DEFAULT_POLL_INTERVAL, Duration::from_millis),
        }
    }
}
