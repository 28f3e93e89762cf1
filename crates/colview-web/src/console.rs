#![forbid(unsafe_code)]

//! `tracing` output to the browser console.
//!
//! Each event is formatted by the `fmt` layer into a [`ConsoleWriter`]
//! buffer, which forwards the finished line to the `console` method
//! matching the event level when dropped.

use std::io;
use std::sync::Once;

use tracing::{Level, Metadata};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;
use web_sys::console;

pub(crate) struct MakeConsoleWriter;

pub(crate) struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        let msg = JsValue::from_str(line.trim_end());
        match self.level {
            Level::ERROR => console::error_1(&msg),
            Level::WARN => console::warn_1(&msg),
            Level::INFO => console::info_1(&msg),
            Level::DEBUG => console::debug_1(&msg),
            Level::TRACE => console::log_1(&msg),
        }
    }
}

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

/// Install the console subscriber once per page.
pub(crate) fn init(level: LevelFilter) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(MakeConsoleWriter)
            .with_max_level(level)
            .with_ansi(false)
            .without_time()
            .finish();
        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            console::warn_1(&JsValue::from_str(&format!(
                "colview: tracing subscriber not installed: {err}"
            )));
        }
    });
}
