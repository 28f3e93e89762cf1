#![forbid(unsafe_code)]

//! The single mutable aggregate every other component reads and writes.
//!
//! `State` is created once at boot from the query string, owned by the
//! [`ViewerCore`](crate::viewer::ViewerCore) and mutated in place by input
//! handlers and async completions. It is never replaced wholesale.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_COLUMNS: u32 = 1;
pub const MAX_COLUMNS: u32 = 10;
pub const DEFAULT_COLUMNS: u32 = 5;
pub const MIN_WIDTH: u32 = 280;
pub const MAX_WIDTH: u32 = 4000;
pub const DEFAULT_WIDTH: u32 = 375;
/// Upper bound on page columns the view builds, whatever the stored count.
pub const MAX_RENDERED_COLUMNS: u32 = 64;

/// How the columns relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// One page tiled across all columns at sequential scroll offsets.
    #[default]
    SinglePage,
    /// One independent URL per column, scrolled in lockstep.
    MultiPage,
}

impl DisplayMode {
    /// Query-string / form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SinglePage => "single-page",
            Self::MultiPage => "multi-page",
        }
    }

    /// Parse a query-string / form value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single-page" => Some(Self::SinglePage),
            "multi-page" => Some(Self::MultiPage),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which URL a control or frame refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ColumnAddress {
    /// The shared single-page URL.
    Primary,
    /// The multi-page URL of one column.
    Indexed(usize),
}

/// Result of the last reachability probe for a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Ok,
    Blocked,
    Unreachable,
    #[default]
    Unknown,
}

impl LoadStatus {
    /// Whether the column renders an error panel instead of a frame.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Blocked | Self::Unreachable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub display_mode: DisplayMode,
    pub primary_url: String,
    pub urls: Vec<String>,
    pub columns_count: u32,
    pub columns_width: u32,
    /// Characters currently typed in the width field; sizes the field.
    pub width_char_count: usize,
    /// Status of `primary_url`, shared by every single-page column.
    pub primary_status: LoadStatus,
    /// Multi-page statuses keyed by column index.
    pub load_status: BTreeMap<usize, LoadStatus>,
    /// Frame identifiers that already fired one `load`.
    pub loaded_frames: HashSet<String>,
}

impl Default for State {
    fn default() -> Self {
        Self::new(DisplayMode::default(), DEFAULT_COLUMNS, DEFAULT_WIDTH)
    }
}

impl State {
    #[must_use]
    pub fn new(display_mode: DisplayMode, columns_count: u32, columns_width: u32) -> Self {
        Self {
            display_mode,
            primary_url: String::new(),
            urls: Vec::new(),
            columns_count,
            columns_width,
            width_char_count: char_count(columns_width),
            primary_status: LoadStatus::Unknown,
            load_status: BTreeMap::new(),
            loaded_frames: HashSet::new(),
        }
    }

    /// URL shown by column `index` under the current display mode.
    ///
    /// Missing multi-page entries read as empty.
    #[must_use]
    pub fn column_url(&self, index: usize) -> &str {
        match self.display_mode {
            DisplayMode::SinglePage => &self.primary_url,
            DisplayMode::MultiPage => self.urls.get(index).map_or("", String::as_str),
        }
    }

    /// Address a column edits or loads under the current display mode.
    #[must_use]
    pub const fn address_of(&self, index: usize) -> ColumnAddress {
        match self.display_mode {
            DisplayMode::SinglePage => ColumnAddress::Primary,
            DisplayMode::MultiPage => ColumnAddress::Indexed(index),
        }
    }

    /// Current URL stored at `address`.
    #[must_use]
    pub fn url_at(&self, address: ColumnAddress) -> &str {
        match address {
            ColumnAddress::Primary => &self.primary_url,
            ColumnAddress::Indexed(index) => self.urls.get(index).map_or("", String::as_str),
        }
    }

    /// Store `url` at `address`, growing `urls` with empty entries as needed.
    pub fn set_url(&mut self, address: ColumnAddress, url: String) {
        match address {
            ColumnAddress::Primary => self.primary_url = url,
            ColumnAddress::Indexed(index) => {
                if self.urls.len() <= index {
                    self.urls.resize(index + 1, String::new());
                }
                self.urls[index] = url;
            }
        }
    }

    /// Status for a column under the current display mode; absent entries
    /// are `Unknown`.
    #[must_use]
    pub fn status_of(&self, index: usize) -> LoadStatus {
        self.status_at(self.address_of(index))
    }

    #[must_use]
    pub fn status_at(&self, address: ColumnAddress) -> LoadStatus {
        match address {
            ColumnAddress::Primary => self.primary_status,
            ColumnAddress::Indexed(index) => {
                self.load_status.get(&index).copied().unwrap_or_default()
            }
        }
    }

    /// Record the status of the URL stored at `address`.
    pub fn set_status(&mut self, address: ColumnAddress, status: LoadStatus) {
        match address {
            ColumnAddress::Primary => self.primary_status = status,
            ColumnAddress::Indexed(index) => {
                self.load_status.insert(index, status);
            }
        }
    }

    /// Forget the status of the URL stored at `address`.
    pub fn clear_status(&mut self, address: ColumnAddress) {
        match address {
            ColumnAddress::Primary => self.primary_status = LoadStatus::Unknown,
            ColumnAddress::Indexed(index) => {
                self.load_status.remove(&index);
            }
        }
    }

    /// Page columns the view builds: `columns_count`, capped at
    /// [`MAX_RENDERED_COLUMNS`] for permissively decoded counts.
    #[must_use]
    pub fn rendered_columns(&self) -> usize {
        self.columns_count.min(MAX_RENDERED_COLUMNS) as usize
    }

    /// Switch display mode. Statuses are cleared wholesale on change.
    ///
    /// Returns `true` if the mode actually changed.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        if self.display_mode == mode {
            return false;
        }
        self.display_mode = mode;
        self.primary_status = LoadStatus::Unknown;
        self.load_status.clear();
        true
    }

    pub fn set_columns_width(&mut self, width: u32) {
        self.columns_width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        self.width_char_count = char_count(self.columns_width);
    }

    pub fn set_columns_count(&mut self, count: u32) {
        self.columns_count = count.clamp(MIN_COLUMNS, MAX_COLUMNS);
    }

    /// Clamp geometry into range.
    pub fn enforce_bounds(&mut self) {
        self.set_columns_count(self.columns_count);
        self.set_columns_width(self.columns_width);
    }

    #[must_use]
    pub fn can_decrement_columns(&self) -> bool {
        self.columns_count > MIN_COLUMNS
    }

    #[must_use]
    pub fn can_increment_columns(&self) -> bool {
        self.columns_count < MAX_COLUMNS
    }

    /// Copy used for the first paint: same geometry, no addresses, so no
    /// frame starts loading before the reveal.
    #[must_use]
    pub fn for_first_paint(&self) -> Self {
        Self {
            primary_url: String::new(),
            urls: Vec::new(),
            primary_status: LoadStatus::Unknown,
            load_status: BTreeMap::new(),
            loaded_frames: HashSet::new(),
            ..self.clone()
        }
    }
}

fn char_count(value: u32) -> usize {
    value.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn display_mode_round_trips_query_values() {
        for mode in [DisplayMode::SinglePage, DisplayMode::MultiPage] {
            assert_eq!(DisplayMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(DisplayMode::parse("Single-Page"), None);
    }

    #[test]
    fn column_url_follows_display_mode() {
        let mut state = State::default();
        state.primary_url = "https://one.test".into();
        state.urls = vec!["https://a.test".into(), String::new()];

        assert_eq!(state.column_url(3), "https://one.test");

        state.set_display_mode(DisplayMode::MultiPage);
        assert_eq!(state.column_url(0), "https://a.test");
        assert_eq!(state.column_url(1), "");
        assert_eq!(state.column_url(7), "");
    }

    #[test]
    fn set_url_pads_missing_entries() {
        let mut state = State::default();
        state.set_url(ColumnAddress::Indexed(2), "https://c.test".into());
        assert_eq!(state.urls, vec!["", "", "https://c.test"]);
    }

    #[test]
    fn mode_change_clears_statuses() {
        let mut state = State::default();
        state.set_status(ColumnAddress::Indexed(1), LoadStatus::Blocked);
        assert!(!state.set_display_mode(DisplayMode::SinglePage));
        assert_eq!(state.status_at(ColumnAddress::Indexed(1)), LoadStatus::Blocked);

        state.set_status(ColumnAddress::Primary, LoadStatus::Ok);
        assert!(state.set_display_mode(DisplayMode::MultiPage));
        assert!(state.load_status.is_empty());
        assert_eq!(state.primary_status, LoadStatus::Unknown);
    }

    #[test]
    fn primary_status_covers_every_single_page_column() {
        let mut state = State::new(DisplayMode::SinglePage, 3, DEFAULT_WIDTH);
        state.set_status(ColumnAddress::Primary, LoadStatus::Unreachable);
        assert!(state.load_status.is_empty());
        assert_eq!(state.status_of(2), LoadStatus::Unreachable);

        state.set_columns_count(6);
        assert_eq!(state.status_of(5), LoadStatus::Unreachable);

        state.clear_status(ColumnAddress::Primary);
        assert_eq!(state.status_of(0), LoadStatus::Unknown);
    }

    #[test]
    fn primary_status_does_not_leak_into_multi_page() {
        let mut state = State::new(DisplayMode::SinglePage, 2, DEFAULT_WIDTH);
        state.set_status(ColumnAddress::Primary, LoadStatus::Blocked);
        state.display_mode = DisplayMode::MultiPage;
        assert_eq!(state.status_of(0), LoadStatus::Unknown);
        assert_eq!(state.status_at(ColumnAddress::Primary), LoadStatus::Blocked);
    }

    #[test]
    fn rendered_columns_are_capped() {
        let mut state = State::new(DisplayMode::MultiPage, 4_000_000_000, DEFAULT_WIDTH);
        assert_eq!(state.rendered_columns(), MAX_RENDERED_COLUMNS as usize);
        state.set_columns_count(3);
        assert_eq!(state.rendered_columns(), 3);
    }

    #[test]
    fn enforce_bounds_clamps_geometry() {
        let mut state = State::new(DisplayMode::SinglePage, 40, 12);
        state.enforce_bounds();
        assert_eq!(state.columns_count, MAX_COLUMNS);
        assert_eq!(state.columns_width, MIN_WIDTH);
        assert_eq!(state.width_char_count, 3);
    }

    #[test]
    fn stepper_affordances_disable_at_bounds() {
        let low = State::new(DisplayMode::SinglePage, MIN_COLUMNS, DEFAULT_WIDTH);
        assert!(!low.can_decrement_columns());
        assert!(low.can_increment_columns());

        let high = State::new(DisplayMode::SinglePage, MAX_COLUMNS, DEFAULT_WIDTH);
        assert!(high.can_decrement_columns());
        assert!(!high.can_increment_columns());
    }

    #[test]
    fn first_paint_copy_drops_addresses_only() {
        let mut state = State::new(DisplayMode::MultiPage, 2, 400);
        state.urls = vec!["https://a.test".into()];
        state.set_status(ColumnAddress::Indexed(0), LoadStatus::Ok);

        let first = state.for_first_paint();
        assert_eq!(first.columns_count, 2);
        assert_eq!(first.columns_width, 400);
        assert_eq!(first.display_mode, DisplayMode::MultiPage);
        assert!(first.urls.is_empty());
        assert!(first.load_status.is_empty());
    }
}
