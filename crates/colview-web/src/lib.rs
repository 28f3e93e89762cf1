#![forbid(unsafe_code)]

//! Browser front end for Column View.
//!
//! This crate provides [`ColumnViewer`], a `wasm-bindgen`-exported struct
//! that boots a [`colview_core::ViewerCore`] from the page URL and binds it
//! to the DOM:
//!
//! - view trees are handed to a JS `patch(previous, next, dispatch)` function
//!   supplied by the page (the virtual-DOM adapter);
//! - `dispatch(actionJson, event)` routes fired listeners back into the core;
//! - host commands are carried out against `history`, `location`, `fetch`
//!   and the focused element;
//! - the core's deadlines are armed as `setTimeout` callbacks.
//!
//! The helpers below are host-neutral so they run under native tests.

use core::time::Duration;

use colview_core::LoadStatus;
use tracing_subscriber::filter::LevelFilter;

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::ColumnViewer;

/// Address handed to `history.replaceState`.
#[must_use]
pub fn history_url(origin: &str, pathname: &str, query: &str) -> String {
    format!("{origin}{pathname}?{query}")
}

/// Console log level from config; unknown names fall back to `info`.
#[must_use]
pub fn log_level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// `setTimeout` delay for a core deadline.
#[must_use]
pub fn timer_delay_ms(now: Duration, deadline: Duration) -> u32 {
    let delay = deadline.saturating_sub(now);
    // Whole milliseconds, rounded up.
    let ms = delay.as_nanos().div_ceil(1_000_000);
    u32::try_from(ms).unwrap_or(u32::MAX)
}

/// Name exposed to JS for a column status.
#[must_use]
pub const fn status_name(status: LoadStatus) -> &'static str {
    match status {
        LoadStatus::Ok => "ok",
        LoadStatus::Blocked => "blocked",
        LoadStatus::Unreachable => "unreachable",
        LoadStatus::Unknown => "unknown",
    }
}
