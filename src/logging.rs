//! `tracing` output. In the browser each formatted event becomes one console
//! call at the matching severity; on the host it goes to stderr.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{MotionError, Result};

/// Console method an event of a given level is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Debug,
    Log,
    Warn,
    Error,
}

impl ConsoleMethod {
    pub fn for_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Log,
            _ => Self::Debug,
        }
    }
}

/// Installs the global subscriber. A second call leaves the first subscriber in
/// place and returns `Ok`.
pub fn init(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|err| MotionError::InvalidConfig(format!("log level '{directive}': {err}")))?;
    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer::make());
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        tracing::debug!("subscriber already installed");
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
mod writer {
    use std::io;

    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    use super::ConsoleMethod;

    pub fn make() -> MakeConsoleWriter {
        MakeConsoleWriter
    }

    pub struct MakeConsoleWriter;

    /// Buffers one formatted event and hands it to the console when dropped.
    pub struct ConsoleWriter {
        method: ConsoleMethod,
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.buffer);
            let line = JsValue::from_str(text.trim_end());
            match self.method {
                ConsoleMethod::Error => web_sys::console::error_1(&line),
                ConsoleMethod::Warn => web_sys::console::warn_1(&line),
                ConsoleMethod::Log => web_sys::console::log_1(&line),
                ConsoleMethod::Debug => web_sys::console::debug_1(&line),
            }
        }
    }

    impl<'a> MakeWriter<'a> for MakeConsoleWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter { method: ConsoleMethod::Log, buffer: Vec::new() }
        }

        fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
            ConsoleWriter { method: ConsoleMethod::for_level(meta.level()), buffer: Vec::new() }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod writer {
    pub fn make() -> fn() -> std::io::Stderr {
        std::io::stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(ConsoleMethod::for_level(&Level::ERROR), ConsoleMethod::Error);
        assert_eq!(ConsoleMethod::for_level(&Level::WARN), ConsoleMethod::Warn);
        assert_eq!(ConsoleMethod::for_level(&Level::INFO), ConsoleMethod::Log);
        assert_eq!(ConsoleMethod::for_level(&Level::TRACE), ConsoleMethod::Debug);
    }

    #[test]
    fn init_is_idempotent_and_rejects_bad_filters() {
        init("debug").unwrap();
        init("info").unwrap();
        assert!(init("folio=loud").is_err());
    }
}
