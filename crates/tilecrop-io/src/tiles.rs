//! Tile loading over HTTP with the browser's `fetch`.

use gloo_net::http::Request;
use tilecrop_core::{BackendConfig, RgbaImage, TileFetchError, TileIndex, TileSource, decode_tile};
use tracing::debug;

/// Loads tiles from the configured backend.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    config: BackendConfig,
}

impl HttpTileSource {
    /// Create a source for `config`'s tile endpoint.
    #[must_use]
    pub const fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

impl TileSource for HttpTileSource {
    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    async fn fetch_tile(&self, tile: TileIndex) -> Result<RgbaImage, TileFetchError> {
        let url = self.config.tile_url(tile);
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| TileFetchError::Http(e.to_string()))?;

        if !response.ok() {
            return Err(TileFetchError::Status(response.status()));
        }

        let bytes = response
            .binary()
            .await
            .map_err(|e| TileFetchError::Http(e.to_string()))?;
        debug!(%tile, bytes = bytes.len(), "tile downloaded");
        decode_tile(&bytes)
    }
}
