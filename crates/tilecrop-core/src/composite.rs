//! Copy tile sub-rectangles onto the output raster.
//!
//! Compositing is synchronous and single-threaded: tiles are applied one
//! at a time in the order given, which callers keep equal to the scan
//! order of [`TileRange::iter`](crate::region::TileRange::iter). Regions
//! of tiles that failed to load stay at the canvas default, fully
//! transparent black.

use image::RgbaImage;
use tracing::{debug, warn};

use crate::coord::TileIndex;
use crate::region::{CropRegion, Placement};
use crate::types::{StitchResult, TileFetchError};

const CHANNELS: usize = 4;

/// Output raster under construction for one region.
#[derive(Debug)]
pub struct Canvas {
    region: CropRegion,
    image: RgbaImage,
    composited: Vec<TileIndex>,
    skipped: Vec<TileIndex>,
}

impl Canvas {
    /// Allocate a transparent canvas the size of `region`.
    #[must_use]
    pub fn new(region: CropRegion) -> Self {
        let dims = region.dimensions();
        Self {
            region,
            image: RgbaImage::new(dims.width, dims.height),
            composited: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Apply the outcome of one tile fetch.
    ///
    /// Failed fetches are logged and recorded as skipped; they never fail
    /// the run.
    pub fn apply(&mut self, tile: TileIndex, fetched: Result<RgbaImage, TileFetchError>) {
        match fetched {
            Ok(bitmap) => self.draw(tile, &bitmap),
            Err(e) => {
                warn!(%tile, error = %e, "failed to load tile, leaving region blank");
                self.skipped.push(tile);
            }
        }
    }

    /// Copy the part of `bitmap` that overlaps the region.
    pub fn draw(&mut self, tile: TileIndex, bitmap: &RgbaImage) {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            warn!(%tile, "tile image is empty, leaving region blank");
            self.skipped.push(tile);
            return;
        }

        let Some(placement) = self.region.placement(tile, bitmap.width(), bitmap.height()) else {
            debug!(%tile, "tile does not overlap the region");
            return;
        };

        copy_rect(bitmap, &mut self.image, placement);
        self.composited.push(tile);
    }

    /// Finish compositing.
    #[must_use]
    pub fn finish(self) -> StitchResult {
        StitchResult {
            dimensions: self.region.dimensions(),
            image: self.image,
            composited: self.composited,
            skipped: self.skipped,
        }
    }
}

/// Composite a sequence of fetch outcomes onto a fresh canvas.
pub fn composite<I>(region: CropRegion, tiles: I) -> StitchResult
where
    I: IntoIterator<Item = (TileIndex, Result<RgbaImage, TileFetchError>)>,
{
    let mut canvas = Canvas::new(region);
    for (tile, fetched) in tiles {
        canvas.apply(tile, fetched);
    }
    canvas.finish()
}

/// Copy `placement` from `src` to `dst` row by row, 1:1.
fn copy_rect(src: &RgbaImage, dst: &mut RgbaImage, placement: Placement) {
    let src_stride = src.width() as usize * CHANNELS;
    let dst_stride = dst.width() as usize * CHANNELS;
    let row_len = placement.width as usize * CHANNELS;

    let src_raw = src.as_raw();
    let dst_raw: &mut [u8] = &mut *dst;

    for row in 0..placement.height as usize {
        let s = (placement.src_y as usize + row) * src_stride + placement.src_x as usize * CHANNELS;
        let d =
            (placement.dest_y as usize + row) * dst_stride + placement.dest_x as usize * CHANNELS;
        dst_raw[d..d + row_len].copy_from_slice(&src_raw[s..s + row_len]);
    }
}
