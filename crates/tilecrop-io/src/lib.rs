//! tilecrop-io: Browser I/O for tilecrop.
//!
//! Hooks the host page's `fetch` and `XMLHttpRequest` so pixel queries
//! reach the core's coordinate observer, loads tiles over HTTP, sleeps on
//! the browser event loop, saves or displays the stitched PNG and routes
//! `tracing` output to the console.
//!
//! Everything here targets `wasm32-unknown-unknown`; the pure logic lives
//! in `tilecrop-core`.

pub mod download;
pub mod intercept;
pub mod log;
pub mod output;
pub mod tiles;
pub mod timer;
pub mod viewer;

pub use download::{DOWNLOAD_FILENAME, DownloadError, trigger_download};
pub use intercept::{InterceptConfig, InterceptError, Interceptor};
pub use log::init_console_logging;
pub use output::{OutputError, OutputMode, deliver};
pub use tiles::HttpTileSource;
pub use timer::BrowserTimer;
pub use viewer::{ViewerError, open_in_new_window};
