//! Stitch the region between two selected points into one raster.
//!
//! 1. Compute the crop region from the two points (order independent).
//! 2. Reject regions with zero width or height.
//! 3. List the candidate tiles covering the region.
//! 4. Fetch every candidate concurrently; failures are non-fatal.
//! 5. Composite the fetched tiles in scan order, regardless of the
//!    order in which the fetches completed.
//! 6. Encode the raster as PNG ([`stitch_png`] only).

use futures::future::join_all;
use tracing::{debug, info};

use crate::composite::composite;
use crate::config::BackendConfig;
use crate::encode::encode_png;
use crate::region::CropRegion;
use crate::select::Selection;
use crate::tile::TileSource;
use crate::types::{Dimensions, StitchError, StitchResult};

/// An encoded stitch result, ready for an output sink.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Size of the encoded image.
    pub dimensions: Dimensions,
}

/// Stitch the region spanned by `selection`.
///
/// # Errors
///
/// Returns [`StitchError::InvalidConfig`] for an unusable config,
/// [`StitchError::InvalidRegion`] if the points do not span a positive
/// area, and [`StitchError::RasterTooLarge`] if the output would be too
/// big to allocate. Tile failures are not errors; see
/// [`StitchResult::skipped`].
pub async fn stitch<S: TileSource>(
    source: &S,
    selection: &Selection,
    config: &BackendConfig,
) -> Result<StitchResult, StitchError> {
    config.validate()?;
    let region = CropRegion::from_selection(selection, config.tile_size)?;
    let tiles = region.tiles();
    let dims = region.dimensions();

    info!(
        from = %selection.first,
        to = %selection.second,
        width = dims.width,
        height = dims.height,
        tiles = tiles.len(),
        "stitching region"
    );

    // join_all yields results in input order, which is the scan order.
    let fetches = tiles.iter().map(|tile| async move {
        debug!(%tile, "fetching tile");
        (tile, source.fetch_tile(tile).await)
    });
    let fetched = join_all(fetches).await;

    let result = composite(region, fetched);
    info!(
        composited = result.composited.len(),
        skipped = result.skipped.len(),
        "stitched region"
    );
    Ok(result)
}

/// Stitch and encode as PNG.
///
/// # Errors
///
/// Everything [`stitch`] returns, plus [`StitchError::EncodingFailure`].
pub async fn stitch_png<S: TileSource>(
    source: &S,
    selection: &Selection,
    config: &BackendConfig,
) -> Result<EncodedImage, StitchError> {
    let result = stitch(source, selection, config).await?;
    let png = encode_png(&result.image)?;
    Ok(EncodedImage {
        png,
        dimensions: result.dimensions,
    })
}
