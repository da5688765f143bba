//! Backend and capture configuration.
//!
//! All parameters have defaults matching the public pixel-canvas backend,
//! exposed as `DEFAULT_*` associated constants so front ends (CLI flags,
//! the browser controller) cannot silently diverge from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coord::{TILE_SIZE, TileIndex};

/// Errors raised by [`BackendConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `tile_size` was zero.
    #[error("tile size must be positive")]
    ZeroTileSize,

    /// `backend_origin` was empty.
    #[error("backend origin must not be empty")]
    EmptyOrigin,

    /// The pixel-query pattern could not be compiled.
    #[error("invalid pixel pattern: {0}")]
    Pattern(String),
}

/// Where the backend lives and how its URLs are shaped.
///
/// Pixel queries look like
/// `{backend_origin}/{pixel_prefix}/{tileX}/{tileY}?x={px}&y={py}` and
/// tile images like `{backend_origin}/{tiles_prefix}/{tileX}/{tileY}.png`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Scheme and host of the backend, without a trailing slash.
    pub backend_origin: String,

    /// Path prefix of the per-pixel info endpoint.
    pub pixel_prefix: String,

    /// Path prefix of the tile image endpoint.
    pub tiles_prefix: String,

    /// Edge length of every tile, in pixels.
    pub tile_size: u32,
}

impl BackendConfig {
    /// Default backend origin.
    pub const DEFAULT_BACKEND_ORIGIN: &'static str = "https://backend.wplace.live";
    /// Default pixel endpoint prefix.
    pub const DEFAULT_PIXEL_PREFIX: &'static str = "s0/pixel";
    /// Default tile endpoint prefix.
    pub const DEFAULT_TILES_PREFIX: &'static str = "files/s0/tiles";
    /// Default tile edge length.
    pub const DEFAULT_TILE_SIZE: u32 = TILE_SIZE;

    /// Check the invariants the rest of the crate relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTileSize`] or [`ConfigError::EmptyOrigin`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if self.backend_origin.trim().is_empty() {
            return Err(ConfigError::EmptyOrigin);
        }
        Ok(())
    }

    /// URL of the PNG for one tile.
    #[must_use]
    pub fn tile_url(&self, tile: TileIndex) -> String {
        format!(
            "{}/{}/{}/{}.png",
            trim_slashes_end(&self.backend_origin),
            trim_slashes(&self.tiles_prefix),
            tile.x,
            tile.y,
        )
    }

    /// Origin plus pixel prefix, the literal part of every pixel query.
    #[must_use]
    pub fn pixel_endpoint(&self) -> String {
        format!(
            "{}/{}",
            trim_slashes_end(&self.backend_origin),
            trim_slashes(&self.pixel_prefix),
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_origin: Self::DEFAULT_BACKEND_ORIGIN.to_owned(),
            pixel_prefix: Self::DEFAULT_PIXEL_PREFIX.to_owned(),
            tiles_prefix: Self::DEFAULT_TILES_PREFIX.to_owned(),
            tile_size: Self::DEFAULT_TILE_SIZE,
        }
    }
}

/// Timing of the click-then-observe capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// How long a click waits for the page's own pixel request.
    pub grace_interval: Duration,

    /// How often the observation slot is sampled while waiting.
    pub poll_interval: Duration,
}

impl CaptureConfig {
    /// Default grace interval.
    pub const DEFAULT_GRACE_INTERVAL: Duration = Duration::from_millis(1000);
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            grace_interval: Self::DEFAULT_GRACE_INTERVAL,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

fn trim_slashes_end(s: &str) -> &str {
    s.trim().trim_end_matches('/')
}

fn trim_slashes(s: &str) -> &str {
    s.trim().trim_matches('/')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_tile_url() {
        let config = BackendConfig::default();
        assert_eq!(
            config.tile_url(TileIndex::new(12, 34)),
            "https://backend.wplace.live/files/s0/tiles/12/34.png"
        );
    }

    #[test]
    fn stray_slashes_are_normalized() {
        let config = BackendConfig {
            backend_origin: "http://localhost:8080/".into(),
            tiles_prefix: "/tiles/".into(),
            pixel_prefix: "/api/pixel/".into(),
            ..BackendConfig::default()
        };
        assert_eq!(
            config.tile_url(TileIndex::new(0, 1)),
            "http://localhost:8080/tiles/0/1.png"
        );
        assert_eq!(config.pixel_endpoint(), "http://localhost:8080/api/pixel");
    }

    #[test]
    fn validate_rejects_zero_tile_size() {
        let config = BackendConfig {
            tile_size: 0,
            ..BackendConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTileSize));
    }

    #[test]
    fn validate_rejects_blank_origin() {
        let config = BackendConfig {
            backend_origin: "  ".into(),
            ..BackendConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyOrigin));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BackendConfig = serde_json::from_str(r#"{"tile_size": 256}"#).unwrap();
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.backend_origin, BackendConfig::DEFAULT_BACKEND_ORIGIN);
    }
}
