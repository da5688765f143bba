//! Native tile sources: a local directory tree or a tile server.

use std::path::PathBuf;
use std::time::Duration;

use tilecrop_core::{BackendConfig, RgbaImage, TileFetchError, TileIndex, TileSource, decode_tile};
use tracing::debug;

/// User-Agent sent to tile servers; some reject requests without one.
const USER_AGENT: &str = concat!("tilecrop/", env!("CARGO_PKG_VERSION"));

/// Reads tiles laid out as `{root}/{x}/{y}.png`, the same shape as the
/// server's tile paths.
#[derive(Debug, Clone)]
pub struct DirTileSource {
    root: PathBuf,
}

impl DirTileSource {
    /// Serve tiles from `root`.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path(&self, tile: TileIndex) -> PathBuf {
        self.root
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }
}

impl TileSource for DirTileSource {
    async fn fetch_tile(&self, tile: TileIndex) -> Result<RgbaImage, TileFetchError> {
        let path = self.path(tile);
        debug!(path = %path.display(), "reading tile");
        let bytes = std::fs::read(&path)?;
        decode_tile(&bytes)
    }
}

/// Downloads tiles over HTTP with a blocking client.
///
/// Each fetch blocks the thread, so tiles load one after another even
/// though the stitcher polls them together.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: reqwest::blocking::Client,
    config: BackendConfig,
}

impl HttpTileSource {
    /// Build a client for `config`'s tile endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TileFetchError::Http`] if the client cannot be built.
    pub fn new(config: BackendConfig, timeout: Duration) -> Result<Self, TileFetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TileFetchError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl TileSource for HttpTileSource {
    async fn fetch_tile(&self, tile: TileIndex) -> Result<RgbaImage, TileFetchError> {
        let url = self.config.tile_url(tile);
        debug!(%url, "downloading tile");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| TileFetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileFetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TileFetchError::Http(format!("failed to read response: {e}")))?;
        decode_tile(&bytes)
    }
}
