//! Deliver an encoded stitch result to the user.

use serde::{Deserialize, Serialize};
use tilecrop_core::{EncodedImage, PNG_MIME};

use crate::download::{DOWNLOAD_FILENAME, DownloadError, trigger_download};
use crate::viewer::{ViewerError, open_in_new_window};

/// How the finished image is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Save as `stitched.png`.
    #[default]
    Download,
    /// Show in a new browser window.
    NewWindow,
}

impl OutputMode {
    /// Map the host page's "open in new tab" flag.
    #[must_use]
    pub const fn from_new_tab(open_in_new_tab: bool) -> Self {
        if open_in_new_tab {
            Self::NewWindow
        } else {
            Self::Download
        }
    }
}

/// Errors from delivering output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The download could not be started.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The viewer window could not be opened.
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// Hand `image` to the user in `mode`.
///
/// # Errors
///
/// Returns [`OutputError`] if the browser refuses either presentation.
pub fn deliver(image: &EncodedImage, mode: OutputMode) -> Result<(), OutputError> {
    match mode {
        OutputMode::Download => trigger_download(&image.png, DOWNLOAD_FILENAME, PNG_MIME)?,
        OutputMode::NewWindow => open_in_new_window(&image.png, image.dimensions)?,
    }
    tracing::info!(
        ?mode,
        width = image.dimensions.width,
        height = image.dimensions.height,
        bytes = image.png.len(),
        "delivered stitched image"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_tab_flag_selects_mode() {
        assert_eq!(OutputMode::from_new_tab(true), OutputMode::NewWindow);
        assert_eq!(OutputMode::from_new_tab(false), OutputMode::Download);
        assert_eq!(OutputMode::default(), OutputMode::Download);
    }

    #[test]
    fn mode_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&OutputMode::NewWindow).unwrap(),
            "\"new_window\""
        );
    }
}
