//! Shared types for the tilecrop capture and stitching pipeline.

use serde::{Deserialize, Serialize};

use crate::coord::TileIndex;

/// Re-export `RgbaImage` so downstream crates can hand tiles and output
/// rasters around without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Output of a stitch run.
///
/// `skipped` lists tiles that were needed but could not be loaded; the
/// matching regions of `image` are left fully transparent.
#[derive(Debug, Clone)]
pub struct StitchResult {
    /// The cropped raster.
    pub image: RgbaImage,
    /// Size of `image`.
    pub dimensions: Dimensions,
    /// Tiles whose pixels were copied, in scan order.
    pub composited: Vec<TileIndex>,
    /// Tiles that failed to load, in scan order.
    pub skipped: Vec<TileIndex>,
}

/// Serializable summary of a [`StitchResult`], without pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchSummary {
    /// Output size.
    pub dimensions: Dimensions,
    /// Tiles whose pixels were copied.
    pub composited: Vec<TileIndex>,
    /// Tiles that failed to load.
    pub skipped: Vec<TileIndex>,
}

impl StitchResult {
    /// Summarize the run without the raster.
    #[must_use]
    pub fn summary(&self) -> StitchSummary {
        StitchSummary {
            dimensions: self.dimensions,
            composited: self.composited.clone(),
            skipped: self.skipped.clone(),
        }
    }
}

/// Why a point capture did not add a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// No selection is in progress.
    #[error("point selection is not active")]
    NotSelecting,

    /// Both points are already selected.
    #[error("two points already selected")]
    AlreadyComplete,

    /// Another click is still waiting for its coordinates.
    #[error("a capture is already in progress")]
    CaptureInFlight,

    /// The grace interval elapsed without a pixel query being observed.
    #[error("no coordinates captured for click; click the map again")]
    NoObservation,

    /// The selection was stopped or restarted while the capture waited.
    #[error("capture cancelled")]
    Cancelled,
}

impl CaptureError {
    /// Whether the failure should be shown to the user.
    ///
    /// Ignored clicks and stale captures are silent no-ops.
    #[must_use]
    pub const fn is_user_facing(self) -> bool {
        matches!(self, Self::NoObservation)
    }
}

/// Errors that abort a stitch run.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// Stitching needs exactly two points.
    #[error("exactly two points are required, got {0}")]
    WrongPointCount(usize),

    /// The two points do not span a region of positive area.
    #[error(
        "invalid selection region {width}x{height}; make sure you picked two different points"
    )]
    InvalidRegion {
        /// Horizontal span of the points.
        width: u64,
        /// Vertical span of the points.
        height: u64,
    },

    /// The region is too large to allocate as one raster.
    #[error("selection region {width}x{height} exceeds the {max_edge}x{max_edge} pixel limit")]
    RasterTooLarge {
        /// Horizontal span of the points.
        width: u64,
        /// Vertical span of the points.
        height: u64,
        /// Longest supported edge, in pixels.
        max_edge: u64,
    },

    /// The tile grid configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ConfigError),

    /// The stitched raster could not be encoded, or encoded to nothing.
    #[error("failed to generate image: {0}")]
    EncodingFailure(String),
}

impl From<image::ImageError> for StitchError {
    fn from(err: image::ImageError) -> Self {
        Self::EncodingFailure(err.to_string())
    }
}

/// Why a single tile could not be used.
///
/// Never fatal: the tile is skipped and stitching continues.
#[derive(Debug, thiserror::Error)]
pub enum TileFetchError {
    /// The request did not complete.
    #[error("request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Reading a local tile file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The body was not a decodable image.
    #[error("failed to decode tile: {0}")]
    Decode(#[from] image::ImageError),

    /// The tile decoded to zero pixels, or the body was empty.
    #[error("tile image is empty")]
    EmptyImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_observation_is_user_facing() {
        assert!(CaptureError::NoObservation.is_user_facing());
        for quiet in [
            CaptureError::NotSelecting,
            CaptureError::AlreadyComplete,
            CaptureError::CaptureInFlight,
            CaptureError::Cancelled,
        ] {
            assert!(!quiet.is_user_facing(), "{quiet:?}");
        }
    }

    #[test]
    fn invalid_region_message_mentions_size() {
        let err = StitchError::InvalidRegion {
            width: 0,
            height: 12,
        };
        assert!(err.to_string().contains("0x12"));
    }
}
