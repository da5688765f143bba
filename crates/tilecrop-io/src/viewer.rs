//! Show the stitched image in a new browser window.
//!
//! The window gets a dark background and the image at its natural size,
//! titled with the file name and dimensions.

use tilecrop_core::{Dimensions, PNG_MIME};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;

use crate::download::{DOWNLOAD_FILENAME, blob_url};

const PAGE_STYLE: &str = "margin:0;background:rgb(14,14,14);\
    display:flex;align-items:flex-start;justify-content:center;";
const IMAGE_STYLE: &str = "display:block;max-width:none;image-rendering:pixelated;";

/// Errors that can occur when opening the viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// `window.open` returned nothing, usually because of a popup blocker.
    #[error("could not open a new window; allow popups for this page")]
    Blocked,

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for ViewerError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Window title for an image of `dimensions`.
#[must_use]
pub fn viewer_title(dimensions: Dimensions) -> String {
    format!(
        "{DOWNLOAD_FILENAME} ({}\u{d7}{})",
        dimensions.width, dimensions.height
    )
}

/// Open a new window showing `png`.
///
/// The image is served from a Blob URL owned by this page; it is not
/// revoked, since the viewer keeps referencing it for its lifetime.
///
/// # Errors
///
/// Returns [`ViewerError::Blocked`] if the window could not be opened and
/// [`ViewerError::JsError`] if building its content fails.
pub fn open_in_new_window(png: &[u8], dimensions: Dimensions) -> Result<(), ViewerError> {
    let window =
        web_sys::window().ok_or_else(|| ViewerError::JsError("no global window".into()))?;
    let popup = window
        .open_with_url_and_target("", "_blank")?
        .ok_or(ViewerError::Blocked)?;
    let document = popup
        .document()
        .ok_or_else(|| ViewerError::JsError("new window has no document".into()))?;

    document.set_title(&viewer_title(dimensions));
    let body = document
        .body()
        .ok_or_else(|| ViewerError::JsError("new window has no body".into()))?;
    body.set_attribute("style", PAGE_STYLE)?;

    let img: web_sys::HtmlImageElement = document
        .create_element("img")?
        .dyn_into()
        .map_err(|e| ViewerError::JsError(format!("failed to cast element: {e:?}")))?;
    img.set_src(&blob_url(png, PNG_MIME)?);
    img.set_alt(DOWNLOAD_FILENAME);
    img.set_width(dimensions.width);
    img.set_height(dimensions.height);
    img.set_attribute("style", IMAGE_STYLE)?;

    body.append_child(&img)?;
    Ok(())
}
