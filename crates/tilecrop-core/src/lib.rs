//! tilecrop-core: Two-point tile region capture and stitching (sans-IO).
//!
//! Turns two points picked on a tiled pixel canvas into one cropped
//! raster:
//! observe pixel query -> select two points -> crop region ->
//! fetch covering tiles -> composite in scan order -> encode PNG.
//!
//! This crate has **no I/O dependencies**. Tile loading and sleeping are
//! abstracted behind [`TileSource`] and [`Timer`]; the browser
//! implementations live in `tilecrop-io`, the filesystem and blocking
//! HTTP ones in `tilecrop-cli`.

pub mod capture;
pub mod composite;
pub mod config;
pub mod coord;
pub mod encode;
pub mod observe;
pub mod region;
pub mod select;
pub mod stitch;
pub mod tile;
pub mod types;

pub use capture::{Timer, capture_point, wait_for_observation};
pub use config::{BackendConfig, CaptureConfig, ConfigError};
pub use coord::{AbsolutePoint, Coordinate, CoordinateError, TILE_SIZE, TileIndex};
pub use encode::{PNG_MIME, PNG_SIGNATURE, encode_png};
pub use observe::{CoordinateObserver, MatchError, ObservationSlot, PixelQueryMatcher};
pub use region::{CropRegion, TileRange};
pub use select::{CapturedPoint, PointSelector, Selection, SelectionState};
pub use stitch::{EncodedImage, stitch, stitch_png};
pub use tile::{TileSource, decode_tile};
pub use types::{
    CaptureError, Dimensions, RgbaImage, StitchError, StitchResult, StitchSummary, TileFetchError,
};
