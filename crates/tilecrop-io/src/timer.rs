//! [`Timer`] backed by the browser's `setTimeout`.

use std::time::Duration;

use tilecrop_core::Timer;

/// Sleeps on the browser event loop via `gloo-timers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}
