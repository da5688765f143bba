//! `tracing` output for the browser console.
//!
//! Each formatted event is buffered and written as one console call on
//! flush, at a severity matching the event level and prefixed so the
//! lines are easy to find among the host page's own output.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wasm_bindgen::JsValue;

/// Prefix of every console line.
pub const LOG_PREFIX: &str = "[tilecrop]";

/// Default filter directive when none is given.
pub const DEFAULT_FILTER: &str = "info";

/// Install the console subscriber as the global default.
///
/// `filter` uses [`EnvFilter`] syntax, e.g. `"tilecrop_core=debug"`. An
/// unparsable filter falls back to [`DEFAULT_FILTER`]. Calling this more
/// than once keeps the first subscriber.
pub fn init_console_logging(filter: Option<&str>) {
    let env_filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time();

    // Already initialised: keep the existing subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

/// Severity of a console call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleLevel {
    Log,
    Warn,
    Error,
}

impl From<&Level> for ConsoleLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            _ => Self::Log,
        }
    }
}

/// Hands out one [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(ConsoleLevel::Log)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(meta.level().into())
    }
}

/// Buffers one formatted event.
#[derive(Debug)]
struct ConsoleWriter {
    level: ConsoleLevel,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    const fn new(level: ConsoleLevel) -> Self {
        Self {
            level,
            buf: Vec::new(),
        }
    }

    fn line(&self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buf);
        let text = text.trim_end();
        (!text.is_empty()).then(|| format!("{LOG_PREFIX} {text}"))
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(line) = self.line() {
            let line = JsValue::from_str(&line);
            match self.level {
                ConsoleLevel::Log => web_sys::console::log_1(&line),
                ConsoleLevel::Warn => web_sys::console::warn_1(&line),
                ConsoleLevel::Error => web_sys::console::error_1(&line),
            }
        }
        self.buf.clear();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn levels_map_to_console_severity() {
        assert_eq!(ConsoleLevel::from(&Level::ERROR), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::from(&Level::WARN), ConsoleLevel::Warn);
        assert_eq!(ConsoleLevel::from(&Level::INFO), ConsoleLevel::Log);
        assert_eq!(ConsoleLevel::from(&Level::TRACE), ConsoleLevel::Log);
    }

    #[test]
    fn buffered_event_becomes_one_prefixed_line() {
        let mut writer = ConsoleWriter::new(ConsoleLevel::Log);
        writer.write_all(b"tilecrop_core::stitch: ").unwrap();
        writer.write_all(b"stitched region\n").unwrap();
        assert_eq!(
            writer.line().as_deref(),
            Some("[tilecrop] tilecrop_core::stitch: stitched region")
        );
        // Nothing to emit after the buffer is consumed.
        writer.buf.clear();
        assert_eq!(writer.line(), None);
    }
}
