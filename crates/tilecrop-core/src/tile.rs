//! Tile sources and tile decoding.
//!
//! A [`TileSource`] turns a [`TileIndex`] into a decoded bitmap. The
//! browser fetches over HTTP, the CLI reads a directory or an HTTP
//! server; both decode through [`decode_tile`].

use std::future::Future;

use image::RgbaImage;

use crate::coord::TileIndex;
use crate::types::TileFetchError;

/// Something that can load tile bitmaps.
///
/// Fetches for different tiles are independent and may be polled
/// concurrently. No `Send` bound: the browser build is single-threaded.
pub trait TileSource {
    /// Load and decode one tile.
    fn fetch_tile(
        &self,
        tile: TileIndex,
    ) -> impl Future<Output = Result<RgbaImage, TileFetchError>>;
}

/// Decode raw tile bytes (PNG, JPEG, WebP) into RGBA.
///
/// # Errors
///
/// Returns [`TileFetchError::EmptyImage`] for an empty body or a
/// zero-size image and [`TileFetchError::Decode`] for undecodable data.
pub fn decode_tile(bytes: &[u8]) -> Result<RgbaImage, TileFetchError> {
    if bytes.is_empty() {
        return Err(TileFetchError::EmptyImage);
    }

    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(TileFetchError::EmptyImage);
    }
    Ok(img.to_rgba8())
}
