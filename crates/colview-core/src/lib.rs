#![forbid(unsafe_code)]

//! `colview-core` is the platform-independent engine behind Column View.
//!
//! Column View renders one or more web pages inside side-by-side columns so a
//! site can be previewed at several simulated device widths (single-page
//! mode) or several URLs can be compared at the same scroll depth
//! (multi-page mode).
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes UI events,
//!   scroll notifications and probe results, and drains [`HostCommand`]s.
//! - **Deterministic time**: the host advances a monotonic clock explicitly;
//!   every debounce window and the scroll re-entrancy guard expire against it.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The browser bindings live in `colview-web`. Nothing in this crate touches
//! JS types, so the whole engine runs under native `cargo test`.

pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod history;
pub mod input;
pub mod probe;
pub mod reload;
pub mod render;
pub mod scroll;
pub mod state;
pub mod tree;
pub mod view;
pub mod viewer;

pub use clock::DeterministicClock;
pub use config::{BoundsPolicy, ViewerConfig};
pub use error::{Result, ViewerError};
pub use input::UiEvent;
pub use probe::{ProbeOutcome, ProbeRequest};
pub use render::Patcher;
pub use scroll::{ColumnSurface, NavIndicator, ScrollOutcome, ScrollSynchronizer};
pub use state::{ColumnAddress, DisplayMode, LoadStatus, State};
pub use tree::{Node, UiAction};
pub use viewer::{FrameLoadOutcome, HostCommand, ViewerCore};
