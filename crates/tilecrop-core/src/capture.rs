//! The click-then-observe capture cycle.
//!
//! A map click does not carry coordinates. The host page reacts to the
//! click by requesting pixel info, and that request is what
//! [`CoordinateObserver`](crate::observe::CoordinateObserver) decodes. A
//! capture therefore clears the observation slot, then waits until the
//! slot is populated or the grace interval runs out.

use std::cell::RefCell;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::CaptureConfig;
use crate::coord::Coordinate;
use crate::observe::ObservationSlot;
use crate::select::{CapturedPoint, PointSelector};
use crate::types::CaptureError;

/// Async sleep provided by the runtime.
pub trait Timer {
    /// Resolve after `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Wait for the next observation, up to `config.grace_interval`.
///
/// The slot is sampled every `config.poll_interval`. The observation is
/// taken out of the slot, so it cannot be latched twice.
pub async fn wait_for_observation<T: Timer>(
    slot: &ObservationSlot,
    timer: &T,
    config: &CaptureConfig,
) -> Option<Coordinate> {
    let step = config.poll_interval.max(Duration::from_millis(1));
    let mut waited = Duration::ZERO;
    loop {
        if let Some(coordinate) = slot.take() {
            debug!(%coordinate, waited_ms = waited.as_millis(), "observation arrived");
            return Some(coordinate);
        }
        if waited >= config.grace_interval {
            return None;
        }
        let nap = step.min(config.grace_interval - waited);
        timer.sleep(nap).await;
        waited += nap;
    }
}

/// Run one full capture for a user click.
///
/// The selector is borrowed only around the synchronous transitions, never
/// across the wait, so `stop()` may be called while the capture is
/// pending; the capture then resolves to [`CaptureError::Cancelled`].
///
/// # Errors
///
/// Any [`CaptureError`]; see [`PointSelector::begin_capture`] and
/// [`PointSelector::complete_capture`].
pub async fn capture_point<T: Timer>(
    selector: &RefCell<PointSelector>,
    slot: &ObservationSlot,
    timer: &T,
    config: &CaptureConfig,
) -> Result<CapturedPoint, CaptureError> {
    let ticket = selector.borrow_mut().begin_capture()?;
    slot.clear();

    let observation = wait_for_observation(slot, timer, config).await;
    let outcome = selector.borrow_mut().complete_capture(ticket, observation);
    if let Err(CaptureError::NoObservation) = outcome {
        warn!("no coordinates captured for click");
    }
    outcome
}
