//! Crop rectangle and tile-range planning.
//!
//! Two selected points span an axis-aligned rectangle in absolute pixel
//! coordinates, half-open on the right and bottom:
//! `[min_x, max_x) x [min_y, max_y)`. The tiles that may contribute
//! pixels are the inclusive index range
//! `floor(min / tile_size) ..= floor(max / tile_size)` on each axis.
//!
//! The upper bound uses the exclusive edge, so a region ending on a tile
//! boundary lists one extra column or row. That candidate has an empty intersection and is
//! dropped by [`CropRegion::placement`].

use serde::{Deserialize, Serialize};

use crate::coord::{AbsolutePoint, TileIndex};
use crate::select::Selection;
use crate::types::{Dimensions, StitchError};

/// Longest output edge, in pixels. Rasters are at most 16384 x 16384.
pub const MAX_OUTPUT_EDGE: u64 = 16_384;

/// Absolute pixel rectangle covered by a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge (inclusive).
    pub min_x: u64,
    /// Top edge (inclusive).
    pub min_y: u64,
    /// Right edge (exclusive).
    pub max_x: u64,
    /// Bottom edge (exclusive).
    pub max_y: u64,
    /// Tile edge length the region was computed for.
    pub tile_size: u32,
}

/// Where one tile's pixels land in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Left edge of the source rectangle, relative to the tile.
    pub src_x: u32,
    /// Top edge of the source rectangle, relative to the tile.
    pub src_y: u32,
    /// Left edge of the destination, relative to the output.
    pub dest_x: u32,
    /// Top edge of the destination, relative to the output.
    pub dest_y: u32,
    /// Width of the copied rectangle.
    pub width: u32,
    /// Height of the copied rectangle.
    pub height: u32,
}

impl CropRegion {
    /// Compute the region spanned by two absolute points, in either order.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidRegion`] if the span is zero on either
    /// axis, and [`StitchError::RasterTooLarge`] if either edge exceeds
    /// [`MAX_OUTPUT_EDGE`].
    pub fn from_corners(
        a: AbsolutePoint,
        b: AbsolutePoint,
        tile_size: u32,
    ) -> Result<Self, StitchError> {
        if tile_size == 0 {
            return Err(crate::config::ConfigError::ZeroTileSize.into());
        }

        let region = Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
            tile_size,
        };

        let (width, height) = (region.span_x(), region.span_y());
        if width == 0 || height == 0 {
            return Err(StitchError::InvalidRegion { width, height });
        }
        if width > MAX_OUTPUT_EDGE || height > MAX_OUTPUT_EDGE {
            return Err(StitchError::RasterTooLarge {
                width,
                height,
                max_edge: MAX_OUTPUT_EDGE,
            });
        }

        Ok(region)
    }

    /// Compute the region spanned by a completed selection.
    ///
    /// # Errors
    ///
    /// See [`CropRegion::from_corners`].
    pub fn from_selection(selection: &Selection, tile_size: u32) -> Result<Self, StitchError> {
        Self::from_corners(
            selection.first.absolute(tile_size),
            selection.second.absolute(tile_size),
            tile_size,
        )
    }

    const fn span_x(&self) -> u64 {
        self.max_x - self.min_x
    }

    const fn span_y(&self) -> u64 {
        self.max_y - self.min_y
    }

    /// Size of the output raster.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // bounded by from_corners
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.span_x() as u32,
            height: self.span_y() as u32,
        }
    }

    /// The candidate tile range.
    #[must_use]
    pub fn tiles(&self) -> TileRange {
        let size = u64::from(self.tile_size);
        let index = |v: u64| u32::try_from(v / size).unwrap_or(u32::MAX);
        TileRange::new(
            TileIndex::new(index(self.min_x), index(self.min_y)),
            TileIndex::new(index(self.max_x), index(self.max_y)),
        )
    }

    /// Intersect one tile with the region.
    ///
    /// `tile_width` and `tile_height` are the dimensions of the loaded
    /// bitmap, which may be smaller than the grid's tile size. Returns
    /// `None` when the tile contributes no pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // all values bounded by the region / tile size
    pub fn placement(&self, tile: TileIndex, tile_width: u32, tile_height: u32) -> Option<Placement> {
        let size = u64::from(self.tile_size);
        let tile_left = u64::from(tile.x) * size;
        let tile_top = u64::from(tile.y) * size;
        let tile_right = tile_left + u64::from(tile_width.min(self.tile_size));
        let tile_bottom = tile_top + u64::from(tile_height.min(self.tile_size));

        let left = self.min_x.max(tile_left);
        let top = self.min_y.max(tile_top);
        let right = self.max_x.min(tile_right);
        let bottom = self.max_y.min(tile_bottom);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Placement {
            src_x: (left - tile_left) as u32,
            src_y: (top - tile_top) as u32,
            dest_x: (left - self.min_x) as u32,
            dest_y: (top - self.min_y) as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// Inclusive rectangular range of tile indices.
///
/// A range whose `max` lies left of or above `min` on either axis holds no
/// tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    min: TileIndex,
    max: TileIndex,
}

impl TileRange {
    /// The tiles from `min` to `max`, both inclusive.
    #[must_use]
    pub const fn new(min: TileIndex, max: TileIndex) -> Self {
        Self { min, max }
    }

    /// Top-left tile.
    #[must_use]
    pub const fn min(&self) -> TileIndex {
        self.min
    }

    /// Bottom-right tile (inclusive).
    #[must_use]
    pub const fn max(&self) -> TileIndex {
        self.max
    }

    /// Number of tiles in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let cols = u64::from(self.max.x - self.min.x) + 1;
        let rows = u64::from(self.max.y - self.min.y) + 1;
        usize::try_from(cols * rows).unwrap_or(usize::MAX)
    }

    /// Whether the range holds no tiles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Tiles in scan order: row by row, left to right.
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| TileIndex::new(x, y)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::coord::{Coordinate, TILE_SIZE};

    fn abs(x: u64, y: u64) -> AbsolutePoint {
        AbsolutePoint { x, y }
    }

    #[test]
    fn diagonal_scenario_spans_four_tiles() {
        let selection = Selection {
            first: Coordinate::new(TileIndex::new(0, 0), 500, 500, TILE_SIZE).unwrap(),
            second: Coordinate::new(TileIndex::new(1, 1), 500, 500, TILE_SIZE).unwrap(),
        };
        let region = CropRegion::from_selection(&selection, TILE_SIZE).unwrap();
        assert_eq!((region.min_x, region.max_x), (500, 1500));
        assert_eq!((region.min_y, region.max_y), (500, 1500));
        assert_eq!(
            region.dimensions(),
            Dimensions {
                width: 1000,
                height: 1000
            }
        );

        let tiles: Vec<_> = region.tiles().iter().collect();
        assert_eq!(
            tiles,
            vec![
                TileIndex::new(0, 0),
                TileIndex::new(1, 0),
                TileIndex::new(0, 1),
                TileIndex::new(1, 1),
            ]
        );
    }

    #[test]
    fn point_order_does_not_matter() {
        let a = abs(1200, 80);
        let b = abs(300, 2950);
        let ab = CropRegion::from_corners(a, b, TILE_SIZE).unwrap();
        let ba = CropRegion::from_corners(b, a, TILE_SIZE).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(
            ab.dimensions(),
            Dimensions {
                width: 900,
                height: 2870
            }
        );
    }

    #[test]
    fn identical_points_are_invalid() {
        let err = CropRegion::from_corners(abs(10, 10), abs(10, 10), TILE_SIZE).unwrap_err();
        assert!(matches!(
            err,
            StitchError::InvalidRegion {
                width: 0,
                height: 0
            }
        ));
    }

    #[test]
    fn zero_height_is_invalid() {
        let err = CropRegion::from_corners(abs(10, 10), abs(500, 10), TILE_SIZE).unwrap_err();
        assert!(matches!(
            err,
            StitchError::InvalidRegion {
                width: 490,
                height: 0
            }
        ));
    }

    #[test]
    fn oversized_region_is_rejected() {
        let err = CropRegion::from_corners(abs(0, 0), abs(100_000, 100_000), TILE_SIZE).unwrap_err();
        assert!(matches!(err, StitchError::RasterTooLarge { .. }));
    }

    #[test]
    fn each_edge_is_limited() {
        let err = CropRegion::from_corners(abs(0, 0), abs(16_385, 1), TILE_SIZE).unwrap_err();
        assert!(matches!(
            err,
            StitchError::RasterTooLarge {
                width: 16_385,
                height: 1,
                max_edge: MAX_OUTPUT_EDGE,
            }
        ));
        let err = CropRegion::from_corners(abs(7, 0), abs(8, 16_385), TILE_SIZE).unwrap_err();
        assert!(matches!(err, StitchError::RasterTooLarge { height: 16_385, .. }));

        let largest = CropRegion::from_corners(abs(0, 0), abs(16_384, 16_384), TILE_SIZE).unwrap();
        assert_eq!(
            largest.dimensions(),
            Dimensions {
                width: 16_384,
                height: 16_384
            }
        );
    }

    #[test]
    fn single_tile_region() {
        let region = CropRegion::from_corners(abs(2100, 3100), abs(2200, 3300), TILE_SIZE).unwrap();
        let tiles: Vec<_> = region.tiles().iter().collect();
        assert_eq!(tiles, vec![TileIndex::new(2, 3)]);
    }

    #[test]
    fn region_ending_on_boundary_lists_empty_candidate() {
        let region = CropRegion::from_corners(abs(0, 0), abs(1000, 10), TILE_SIZE).unwrap();
        let range = region.tiles();
        assert_eq!(range.len(), 2);
        assert!(region.placement(TileIndex::new(1, 0), 1000, 1000).is_none());
    }

    #[test]
    fn placement_of_straddling_tiles() {
        let region = CropRegion::from_corners(abs(500, 500), abs(1500, 1500), TILE_SIZE).unwrap();

        assert_eq!(
            region.placement(TileIndex::new(0, 0), 1000, 1000),
            Some(Placement {
                src_x: 500,
                src_y: 500,
                dest_x: 0,
                dest_y: 0,
                width: 500,
                height: 500,
            })
        );
        assert_eq!(
            region.placement(TileIndex::new(1, 0), 1000, 1000),
            Some(Placement {
                src_x: 0,
                src_y: 500,
                dest_x: 500,
                dest_y: 0,
                width: 500,
                height: 500,
            })
        );
        assert_eq!(
            region.placement(TileIndex::new(1, 1), 1000, 1000),
            Some(Placement {
                src_x: 0,
                src_y: 0,
                dest_x: 500,
                dest_y: 500,
                width: 500,
                height: 500,
            })
        );
    }

    #[test]
    fn placement_is_clipped_to_small_tiles() {
        let region = CropRegion::from_corners(abs(0, 0), abs(1000, 1000), TILE_SIZE).unwrap();
        let p = region.placement(TileIndex::new(0, 0), 400, 300).unwrap();
        assert_eq!((p.width, p.height), (400, 300));
    }

    #[test]
    fn scan_order_is_row_major() {
        let range = TileRange::new(TileIndex::new(4, 7), TileIndex::new(6, 8));
        let tiles: Vec<_> = range.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(tiles, vec![(4, 7), (5, 7), (6, 7), (4, 8), (5, 8), (6, 8)]);
        assert_eq!(range.len(), 6);
        assert!(!range.is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        for range in [
            TileRange::new(TileIndex::new(6, 7), TileIndex::new(4, 8)),
            TileRange::new(TileIndex::new(4, 8), TileIndex::new(6, 7)),
            TileRange::new(TileIndex::new(1, 1), TileIndex::new(0, 0)),
        ] {
            assert!(range.is_empty(), "{range:?}");
            assert_eq!(range.len(), 0);
            assert_eq!(range.iter().count(), 0);
        }
    }

    #[test]
    fn deserialized_inverted_range_is_empty() {
        let range: TileRange = serde_json::from_str(
            r#"{"min": {"x": 3, "y": 0}, "max": {"x": 1, "y": 0}}"#,
        )
        .unwrap();
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
    }
}
