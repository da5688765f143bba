//! Coordinate capture from observed network requests.
//!
//! The host page answers a map click by issuing a pixel-info request
//! shaped like `{origin}/{pixel_prefix}/{tileX}/{tileY}?x={px}&y={py}`.
//! [`CoordinateObserver::observe`] is fed every read-style request the
//! page makes (from both the fetch-style and the XHR-style entry points)
//! and publishes the decoded [`Coordinate`] into an [`ObservationSlot`].
//!
//! The slot is a single-value inbox: the newest observation shadows any
//! older one that has not been taken yet.

use std::cell::Cell;
use std::rc::Rc;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{BackendConfig, ConfigError};
use crate::coord::{Coordinate, CoordinateError, TileIndex};

/// Reasons a URL did not produce a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// The URL is not a pixel query. This is the normal case.
    #[error("URL is not a pixel query")]
    NoMatch,

    /// A captured number does not fit in 32 bits.
    #[error("pixel query field {0:?} is out of range")]
    Overflow(String),

    /// The offsets do not fit inside a tile.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Compiled matcher for the pixel-query URL shape of one backend.
#[derive(Debug, Clone)]
pub struct PixelQueryMatcher {
    pattern: Regex,
    tile_size: u32,
}

impl PixelQueryMatcher {
    /// Compile the matcher for `config`.
    ///
    /// The origin and prefix are matched literally; only the four numeric
    /// fields are captured.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config is invalid.
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        // Groups: tileX, tileY, pixelX, pixelY. The pixel query must be
        // followed by the end of the URL, another parameter or a fragment.
        let pattern = format!(
            r"{}/(\d+)/(\d+)\?x=(\d+)&y=(\d+)(?:$|[&#])",
            regex::escape(&config.pixel_endpoint()),
        );
        let pattern = Regex::new(&pattern).map_err(|e| ConfigError::Pattern(e.to_string()))?;
        Ok(Self {
            pattern,
            tile_size: config.tile_size,
        })
    }

    /// Decode `url` into a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NoMatch`] for any URL of a different shape,
    /// [`MatchError::Overflow`] for numbers wider than 32 bits and
    /// [`MatchError::Coordinate`] for offsets outside the tile.
    pub fn parse(&self, url: &str) -> Result<Coordinate, MatchError> {
        let captures = self.pattern.captures(url).ok_or(MatchError::NoMatch)?;

        let field = |i: usize| -> Result<u32, MatchError> {
            let text = captures.get(i).map_or("", |m| m.as_str());
            text.parse::<u32>()
                .map_err(|_| MatchError::Overflow(text.to_owned()))
        };

        let tile = TileIndex::new(field(1)?, field(2)?);
        let coordinate = Coordinate::new(tile, field(3)?, field(4)?, self.tile_size)?;
        Ok(coordinate)
    }
}

/// Single-slot inbox carrying the latest observed coordinate from the
/// network side channel to the click handler.
///
/// Clones share the same slot. Writes are last-writer-wins with no
/// locking; the environment is single-threaded.
#[derive(Debug, Clone, Default)]
pub struct ObservationSlot(Rc<Cell<Option<Coordinate>>>);

impl ObservationSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new observation.
    pub fn publish(&self, coordinate: Coordinate) {
        self.0.set(Some(coordinate));
    }

    /// Take the current observation, leaving the slot empty.
    #[must_use]
    pub fn take(&self) -> Option<Coordinate> {
        self.0.take()
    }

    /// Read the current observation without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<Coordinate> {
        self.0.get()
    }

    /// Discard any pending observation.
    pub fn clear(&self) {
        self.0.set(None);
    }
}

/// Feeds request descriptors into an [`ObservationSlot`].
#[derive(Debug, Clone)]
pub struct CoordinateObserver {
    matcher: PixelQueryMatcher,
    slot: ObservationSlot,
}

impl CoordinateObserver {
    /// Create an observer publishing into `slot`.
    #[must_use]
    pub const fn new(matcher: PixelQueryMatcher, slot: ObservationSlot) -> Self {
        Self { matcher, slot }
    }

    /// The slot this observer writes to.
    #[must_use]
    pub const fn slot(&self) -> &ObservationSlot {
        &self.slot
    }

    /// Inspect one outgoing request.
    ///
    /// `method` is `None` when the caller did not specify one, which the
    /// network APIs treat as `GET`. Only read requests whose URL is a
    /// pixel query update the slot; everything else is ignored.
    ///
    /// Returns the published coordinate, if any.
    pub fn observe(&self, method: Option<&str>, url: &str) -> Option<Coordinate> {
        if !is_read_method(method) {
            return None;
        }

        match self.matcher.parse(url) {
            Ok(coordinate) => {
                debug!(%coordinate, "captured coordinates from request");
                self.slot.publish(coordinate);
                Some(coordinate)
            }
            Err(MatchError::NoMatch) => None,
            Err(e) => {
                warn!(url, error = %e, "rejected malformed pixel query");
                None
            }
        }
    }
}

fn is_read_method(method: Option<&str>) -> bool {
    method.is_none_or(|m| m.trim().is_empty() || m.trim().eq_ignore_ascii_case("GET"))
}
