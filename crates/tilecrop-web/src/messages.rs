//! Text shown to the user when an action fails.

use tilecrop_core::{CaptureError, StitchError};
use tilecrop_io::{OutputError, ViewerError};

/// Shown when processing is requested before two points exist.
pub const SELECT_TWO_POINTS: &str = "Please select two points by clicking on the map.";

/// Alert text for a failed click, or `None` if the click is a silent
/// no-op.
#[must_use]
pub fn capture_failure(err: CaptureError) -> Option<String> {
    err.is_user_facing()
        .then(|| "Could not capture coordinates for that click. Please click the map again.".into())
}

/// Alert text for a failed stitch run.
#[must_use]
pub fn stitch_failure(err: &StitchError) -> String {
    match err {
        StitchError::WrongPointCount(_) => SELECT_TWO_POINTS.into(),
        StitchError::InvalidRegion { .. } => {
            "Invalid selection region. Make sure you picked two different points.".into()
        }
        StitchError::EncodingFailure(reason) => {
            format!("Failed to generate image: {reason}.")
        }
        other => format!("Error processing tiles: {other}"),
    }
}

/// Alert text for a failed delivery.
#[must_use]
pub fn output_failure(err: &OutputError) -> String {
    match err {
        OutputError::Viewer(ViewerError::Blocked) => {
            "Cannot open new tab. Please allow popups or try downloading instead.".into()
        }
        other => format!("Error processing tiles: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_observation_alerts_on_click() {
        assert!(capture_failure(CaptureError::NoObservation).is_some());
        assert!(capture_failure(CaptureError::CaptureInFlight).is_none());
        assert!(capture_failure(CaptureError::AlreadyComplete).is_none());
        assert!(capture_failure(CaptureError::Cancelled).is_none());
        assert!(capture_failure(CaptureError::NotSelecting).is_none());
    }

    #[test]
    fn degenerate_region_asks_for_different_points() {
        let msg = stitch_failure(&StitchError::InvalidRegion {
            width: 0,
            height: 12,
        });
        assert!(msg.starts_with("Invalid selection region."));
    }

    #[test]
    fn encoding_failure_names_the_reason() {
        let msg = stitch_failure(&StitchError::EncodingFailure("canvas is empty".into()));
        assert_eq!(msg, "Failed to generate image: canvas is empty.");
    }

    #[test]
    fn blocked_popup_suggests_download() {
        let msg = output_failure(&OutputError::Viewer(ViewerError::Blocked));
        assert!(msg.contains("allow popups"));
    }
}
