#![forbid(unsafe_code)]

//! Scroll synchronization across columns.
//!
//! A scroll event on one column is propagated to every sibling according to
//! the display mode:
//!
//! - **Single page**: columns are contiguous vertical slices of one long
//!   page, so column `i` sits at `source.offset + height * (i - source)`.
//!   A column may never scroll above its tiled floor `height * index`; a
//!   reading below the floor snaps every column to its floor instead of
//!   propagating.
//! - **Multi page**: every column mirrors the source offset literally.
//!
//! Each propagated assignment makes the browser fire a scroll event on the
//! target column. [`ScrollSynchronizer`] holds the index of the column that
//! started the current wave plus a quiet-window deadline; events from any
//! other column inside that window are dropped, so a wave never feeds back
//! into itself.
//!
//! After a propagation the nav-column indicator (first column offset and
//! column height) is written straight to the root element's style through
//! [`ColumnSurface::set_nav_indicator`], bypassing the view tree so it can
//! update every scroll tick without a re-render.

use core::time::Duration;

use crate::state::DisplayMode;

/// The live column elements, as seen by the synchronizer.
///
/// Indexes cover page columns only; the nav column is not part of the
/// surface.
pub trait ColumnSurface {
    fn column_count(&self) -> usize;
    fn scroll_top(&self, index: usize) -> f64;
    fn set_scroll_top(&mut self, index: usize, value: f64);
    /// Rendered viewport height of column `index`.
    fn column_height(&self, index: usize) -> f64;
    fn set_nav_indicator(&mut self, indicator: NavIndicator);
}

/// Scroll-position indicator consumed by the nav column stylesheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavIndicator {
    pub scroll_top: f64,
    pub columns_height: f64,
}

impl NavIndicator {
    /// Inline style for the root container.
    #[must_use]
    pub fn to_style(&self) -> String {
        format!(
            "--columns-height: {}px; --scroll-top: {}px",
            self.columns_height, self.scroll_top
        )
    }
}

/// What a synchronization pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// Source index is not a rendered column.
    NoSuchColumn,
    /// Another column's wave is still in flight.
    Suppressed { active_source: usize },
    /// Single page: the source sat above its floor; every column was reset
    /// to its tiled floor.
    FloorCorrected,
    /// Siblings were aligned to the source.
    Propagated { source: usize, indicator: NavIndicator },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSource {
    index: usize,
    expires_at: Duration,
}

#[derive(Debug, Clone)]
pub struct ScrollSynchronizer {
    quiet_window: Duration,
    active: Option<ActiveSource>,
}

impl ScrollSynchronizer {
    #[must_use]
    pub const fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            active: None,
        }
    }

    /// Column currently owning the propagation wave, if the window is open.
    #[must_use]
    pub fn active_source(&self, now: Duration) -> Option<usize> {
        self.active
            .filter(|active| now < active.expires_at)
            .map(|active| active.index)
    }

    /// When the current wave's guard lapses.
    #[must_use]
    pub fn guard_deadline(&self) -> Option<Duration> {
        self.active.map(|active| active.expires_at)
    }

    /// Handle a scroll notification from column `source`.
    pub fn sync<S: ColumnSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        source: usize,
        mode: DisplayMode,
        now: Duration,
    ) -> ScrollOutcome {
        let count = surface.column_count();
        if source >= count {
            tracing::warn!(target: "colview.scroll", source, count, "scroll from unknown column");
            return ScrollOutcome::NoSuchColumn;
        }

        let offset = surface.scroll_top(source).max(0.0);
        let height = surface.column_height(source);

        if self.active.is_some_and(|active| now >= active.expires_at) {
            self.active = None;
        }
        if let Some(active) = self.active {
            if active.index != source {
                tracing::trace!(
                    target: "colview.scroll",
                    source,
                    active_source = active.index,
                    "scroll suppressed"
                );
                return ScrollOutcome::Suppressed {
                    active_source: active.index,
                };
            }
        }

        if mode == DisplayMode::SinglePage {
            let floor = height * source as f64;
            if offset < floor {
                for index in 0..count {
                    surface.set_scroll_top(index, height * index as f64);
                }
                tracing::trace!(target: "colview.scroll", source, floor, "floor corrected");
                return ScrollOutcome::FloorCorrected;
            }
        }

        self.active = Some(ActiveSource {
            index: source,
            expires_at: now.saturating_add(self.quiet_window),
        });

        for index in (0..count).filter(|&index| index != source) {
            let target = match mode {
                DisplayMode::MultiPage => offset,
                DisplayMode::SinglePage => offset + height * (index as f64 - source as f64),
            };
            surface.set_scroll_top(index, target);
        }

        let indicator = NavIndicator {
            scroll_top: surface.scroll_top(0).max(0.0),
            columns_height: height,
        };
        surface.set_nav_indicator(indicator);
        tracing::trace!(
            target: "colview.scroll",
            source,
            offset,
            height,
            mode = %mode,
            "propagated"
        );
        ScrollOutcome::Propagated { source, indicator }
    }
}

/// In-memory surface used by tests and headless hosts.
///
/// Assignments clamp at zero like a real scroll container; they are also
/// recorded so tests can replay the scroll events a browser would fire.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    pub offsets: Vec<f64>,
    pub height: f64,
    pub indicator: Option<NavIndicator>,
    pub assignments: Vec<usize>,
}

impl MemorySurface {
    #[must_use]
    pub fn new(columns: usize, height: f64) -> Self {
        Self {
            offsets: vec![0.0; columns],
            height,
            indicator: None,
            assignments: Vec::new(),
        }
    }

    /// Take the list of columns assigned since the last call.
    pub fn take_assignments(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.assignments)
    }
}

impl ColumnSurface for MemorySurface {
    fn column_count(&self) -> usize {
        self.offsets.len()
    }

    fn scroll_top(&self, index: usize) -> f64 {
        self.offsets.get(index).copied().unwrap_or(0.0)
    }

    fn set_scroll_top(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.offsets.get_mut(index) {
            *slot = value.max(0.0);
            self.assignments.push(index);
        }
    }

    fn column_height(&self, _index: usize) -> f64 {
        self.height
    }

    fn set_nav_indicator(&mut self, indicator: NavIndicator) {
        self.indicator = Some(indicator);
    }
}
