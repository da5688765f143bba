//! Two-point selection state machine.
//!
//! ```text
//!          start()                 2nd point
//!   Idle ──────────▶ Selecting ──────────────▶ Ready
//!    ▲                  │  ▲                     │
//!    └──── stop() ──────┘  └── 1st point         │
//!    └──────────────────── stop() ───────────────┘
//! ```
//!
//! A click starts a *capture*: the caller clears the observation slot,
//! waits for the page to issue its pixel query, then hands whatever it
//! observed to [`PointSelector::complete_capture`]. Only one capture may
//! be in flight; each carries a [`CaptureTicket`] so a capture that
//! outlives a `stop()`/`start()` cycle is recognised as stale and its
//! result discarded.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coord::Coordinate;
use crate::types::CaptureError;

/// Number of points that make up a complete selection.
pub const POINT_COUNT: usize = 2;

/// Externally visible selector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// No selection in progress.
    Idle,
    /// Collecting points; zero or one captured so far.
    Selecting,
    /// Both points captured; clicks are ignored until restarted.
    Ready,
}

impl SelectionState {
    /// Lowercase name, as reported to page scripts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selecting => "selecting",
            Self::Ready => "ready",
        }
    }
}

/// Proof that a capture was started, tied to one selection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a capture ticket must be passed to complete_capture"]
pub struct CaptureTicket {
    generation: u64,
}

/// Result of a successful capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedPoint {
    /// Position in the selection set (0 or 1).
    pub index: usize,
    /// The coordinate that was appended.
    pub coordinate: Coordinate,
    /// Whether this capture completed the selection.
    pub complete: bool,
}

/// A complete pair of selected points, in click order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// First clicked point.
    pub first: Coordinate,
    /// Second clicked point.
    pub second: Coordinate,
}

impl Selection {
    /// Build a selection from a slice of points.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StitchError::WrongPointCount`] unless `points` has
    /// exactly two elements.
    pub fn from_points(points: &[Coordinate]) -> Result<Self, crate::StitchError> {
        match points {
            [first, second] => Ok(Self {
                first: *first,
                second: *second,
            }),
            _ => Err(crate::StitchError::WrongPointCount(points.len())),
        }
    }
}

/// The two-slot point selector.
#[derive(Debug, Clone)]
pub struct PointSelector {
    state: SelectionState,
    points: Vec<Coordinate>,
    generation: u64,
    in_flight: bool,
}

impl Default for PointSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PointSelector {
    /// Create an idle selector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
            points: Vec::with_capacity(POINT_COUNT),
            generation: 0,
            in_flight: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    /// Points captured so far, in click order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Whether a capture is waiting for its observation.
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.in_flight
    }

    /// The completed selection, once in [`SelectionState::Ready`].
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        if self.state == SelectionState::Ready {
            Selection::from_points(&self.points).ok()
        } else {
            None
        }
    }

    /// Begin a new selection cycle, discarding any previous points.
    pub fn start(&mut self) {
        self.reset(SelectionState::Selecting);
        info!("started point selection");
    }

    /// Abandon the selection. Any in-flight capture becomes stale.
    pub fn stop(&mut self) {
        self.reset(SelectionState::Idle);
        info!("stopped point selection");
    }

    /// Stop if a selection is in progress, otherwise start one.
    ///
    /// Returns the new state.
    pub fn toggle(&mut self) -> SelectionState {
        if self.state == SelectionState::Selecting {
            self.stop();
        } else {
            self.start();
        }
        self.state
    }

    fn reset(&mut self, state: SelectionState) {
        self.state = state;
        self.points.clear();
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = false;
    }

    /// Register a user click and start a capture.
    ///
    /// # Errors
    ///
    /// The click is a no-op, reported as:
    /// - [`CaptureError::NotSelecting`] when idle,
    /// - [`CaptureError::AlreadyComplete`] when both points are captured,
    /// - [`CaptureError::CaptureInFlight`] while another capture is pending.
    pub fn begin_capture(&mut self) -> Result<CaptureTicket, CaptureError> {
        match self.state {
            SelectionState::Idle => Err(CaptureError::NotSelecting),
            SelectionState::Ready => Err(CaptureError::AlreadyComplete),
            SelectionState::Selecting if self.in_flight => Err(CaptureError::CaptureInFlight),
            SelectionState::Selecting => {
                self.in_flight = true;
                Ok(CaptureTicket {
                    generation: self.generation,
                })
            }
        }
    }

    /// Finish the capture started by `ticket` with what was observed.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Cancelled`] if the selection was stopped or
    /// restarted since the ticket was issued (the observation is
    /// discarded), and [`CaptureError::NoObservation`] if nothing was
    /// observed (state is unchanged; the user has to click again).
    pub fn complete_capture(
        &mut self,
        ticket: CaptureTicket,
        observation: Option<Coordinate>,
    ) -> Result<CapturedPoint, CaptureError> {
        if ticket.generation != self.generation || !self.in_flight {
            return Err(CaptureError::Cancelled);
        }
        self.in_flight = false;

        let coordinate = observation.ok_or(CaptureError::NoObservation)?;
        self.points.push(coordinate);
        let index = self.points.len() - 1;
        let complete = self.points.len() == POINT_COUNT;
        if complete {
            self.state = SelectionState::Ready;
        }

        info!(index, %coordinate, "selected point");
        Ok(CapturedPoint {
            index,
            coordinate,
            complete,
        })
    }

    /// Human-readable status line for each point slot.
    #[must_use]
    pub fn labels(&self) -> [String; POINT_COUNT] {
        std::array::from_fn(|i| {
            self.points.get(i).map_or_else(
                || format!("Point {}: Not selected", i + 1),
                |c| format!("Point {}: {c}", i + 1),
            )
        })
    }
}
