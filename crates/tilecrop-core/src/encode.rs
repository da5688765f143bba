//! PNG encoding of the stitched raster.
//!
//! Encoding is the one fatal step of a stitch run: a failed or degenerate
//! result is reported as [`StitchError::EncodingFailure`] and no output is
//! delivered.

use image::{ImageEncoder, RgbaImage};

use crate::types::StitchError;

/// The eight-byte signature every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// MIME type of the encoded output.
pub const PNG_MIME: &str = "image/png";

/// Encode an RGBA raster as PNG.
///
/// # Errors
///
/// Returns [`StitchError::EncodingFailure`] if the raster is empty, the
/// encoder fails, or the output does not look like a PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, StitchError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(StitchError::EncodingFailure("canvas is empty".into()));
    }

    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    if !png_bytes.starts_with(&PNG_SIGNATURE) {
        return Err(StitchError::EncodingFailure(
            "encoder produced invalid output".into(),
        ));
    }
    Ok(png_bytes)
}
