//! Tile grid coordinates.
//!
//! A point on the canvas is addressed by the tile that contains it and
//! its offset inside that tile. The absolute position on the infinite
//! plane is always derived from those four numbers, never stored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of every tile served by the backend, in pixels.
pub const TILE_SIZE: u32 = 1000;

/// Errors raised when building a [`Coordinate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    /// A pixel offset does not fit inside its tile.
    #[error("pixel offset ({pixel_x}, {pixel_y}) is outside a {tile_size}px tile")]
    PixelOutOfRange {
        /// Horizontal offset that was supplied.
        pixel_x: u32,
        /// Vertical offset that was supplied.
        pixel_y: u32,
        /// Tile edge length the offsets were checked against.
        tile_size: u32,
    },

    /// The tile grid has a zero edge length.
    #[error("tile size must be positive")]
    ZeroTileSize,
}

/// Grid index of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileIndex {
    /// Create a new tile index.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({},{})", self.x, self.y)
    }
}

/// Position of a pixel on the infinite plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsolutePoint {
    /// Pixels from the left edge of tile column 0.
    pub x: u64,
    /// Pixels from the top edge of tile row 0.
    pub y: u64,
}

/// A pixel addressed by tile index plus in-tile offset.
///
/// The offsets are guaranteed to lie in `[0, tile_size)` for the grid the
/// coordinate was validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    tile: TileIndex,
    pixel_x: u32,
    pixel_y: u32,
}

impl Coordinate {
    /// Build a coordinate, rejecting offsets that fall outside the tile.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::ZeroTileSize`] if `tile_size` is zero and
    /// [`CoordinateError::PixelOutOfRange`] if either offset is
    /// `>= tile_size`.
    pub const fn new(
        tile: TileIndex,
        pixel_x: u32,
        pixel_y: u32,
        tile_size: u32,
    ) -> Result<Self, CoordinateError> {
        if tile_size == 0 {
            return Err(CoordinateError::ZeroTileSize);
        }
        if pixel_x >= tile_size || pixel_y >= tile_size {
            return Err(CoordinateError::PixelOutOfRange {
                pixel_x,
                pixel_y,
                tile_size,
            });
        }
        Ok(Self {
            tile,
            pixel_x,
            pixel_y,
        })
    }

    /// The tile containing this pixel.
    #[must_use]
    pub const fn tile(&self) -> TileIndex {
        self.tile
    }

    /// Horizontal offset inside the tile.
    #[must_use]
    pub const fn pixel_x(&self) -> u32 {
        self.pixel_x
    }

    /// Vertical offset inside the tile.
    #[must_use]
    pub const fn pixel_y(&self) -> u32 {
        self.pixel_y
    }

    /// Absolute position on the plane for a grid of `tile_size` pixels.
    #[must_use]
    pub fn absolute(&self, tile_size: u32) -> AbsolutePoint {
        AbsolutePoint {
            x: u64::from(self.tile.x) * u64::from(tile_size) + u64::from(self.pixel_x),
            y: u64::from(self.tile.y) * u64::from(tile_size) + u64::from(self.pixel_y),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Pixel({},{})", self.tile, self.pixel_x, self.pixel_y)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn absolute_combines_tile_and_offset() {
        let c = Coordinate::new(TileIndex::new(3, 7), 12, 999, TILE_SIZE).unwrap();
        assert_eq!(c.absolute(TILE_SIZE), AbsolutePoint { x: 3012, y: 7999 });
    }

    #[test]
    fn absolute_does_not_overflow_for_large_tiles() {
        let c = Coordinate::new(TileIndex::new(u32::MAX, u32::MAX), 0, 0, TILE_SIZE).unwrap();
        let abs = c.absolute(TILE_SIZE);
        assert_eq!(abs.x, u64::from(u32::MAX) * 1000);
    }

    #[test]
    fn offset_equal_to_tile_size_is_rejected() {
        let err = Coordinate::new(TileIndex::new(0, 0), TILE_SIZE, 0, TILE_SIZE).unwrap_err();
        assert_eq!(
            err,
            CoordinateError::PixelOutOfRange {
                pixel_x: 1000,
                pixel_y: 0,
                tile_size: 1000,
            }
        );
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let err = Coordinate::new(TileIndex::new(0, 0), 0, 0, 0).unwrap_err();
        assert_eq!(err, CoordinateError::ZeroTileSize);
    }

    #[test]
    fn display_matches_status_label_format() {
        let c = Coordinate::new(TileIndex::new(1, 2), 30, 40, TILE_SIZE).unwrap();
        assert_eq!(c.to_string(), "Tile(1,2) Pixel(30,40)");
    }
}
