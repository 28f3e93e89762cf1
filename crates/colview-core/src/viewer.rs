#![forbid(unsafe_code)]

//! `ViewerCore`: the single owner of viewer state.
//!
//! The host pushes events in (`dispatch`, `on_scroll`, `on_frame_load`,
//! `apply_probe`), advances the clock, calls [`ViewerCore::tick`] at or after
//! [`ViewerCore::next_deadline`], and drains [`HostCommand`]s it must carry
//! out against the browser. All mutation happens on the caller's turn, so
//! every entry point leaves [`State`] render-safe before returning.
//!
//! Input handlers apply in a fixed order:
//!
//! 1. blur the originating control
//! 2. normalize the value
//! 3. mutate state
//! 4. persist to the query string (`ReplaceHistory`)
//! 5. in production, navigate away if the page scheme mismatches
//! 6. re-render
//! 7. write the normalized value back into the control

use core::time::Duration;
use std::collections::{BTreeMap, HashSet};

use crate::clock::{DeterministicClock, duration_from_ms};
use crate::config::{BoundsPolicy, ViewerConfig};
use crate::debounce::Debounce;
use crate::error::Result;
use crate::history::{self, DecodeDefaults};
use crate::input::{UiEvent, normalize_url, protocol_redirect};
use crate::probe::{ProbeOutcome, ProbeRequest, ReachabilityChecker, classify};
use crate::reload::{self, LoadAction};
use crate::render::{Patcher, RenderLoop};
use crate::scroll::{ColumnSurface, ScrollOutcome, ScrollSynchronizer};
use crate::state::{
    ColumnAddress, DisplayMode, LoadStatus, MAX_COLUMNS, MIN_COLUMNS, State,
};
use crate::tree::{Node, UiAction};
use crate::view::WIDTH_FIELD_ID;

/// Side effects the host must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// `history.replaceState(null, "", origin + path + "?" + query)`.
    ReplaceHistory { query: String },
    /// Full navigation (`location.replace`).
    Navigate { href: String },
    /// Blur `document.activeElement`.
    BlurActive,
    /// Overwrite a control's native value.
    SetControlValue { control_id: String, value: String },
    Probe(ProbeRequest),
    /// Add the `loaded` class to `<body>`.
    MarkLoaded,
}

/// What the host should do after a frame `load` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLoadOutcome {
    Ignored,
    Recorded,
    /// Reassign the frame's `src` to `url`.
    Reload { url: String },
}

pub struct ViewerCore<P> {
    config: ViewerConfig,
    clock: DeterministicClock,
    state: State,
    render: RenderLoop<P>,
    scroll: ScrollSynchronizer,
    checker: ReachabilityChecker,
    /// One slot per URL field, so edits to different fields never coalesce.
    url_edits: BTreeMap<ColumnAddress, Debounce<String>>,
    width_edits: Debounce<String>,
    column_steps: Debounce<u32>,
    resize: Debounce<()>,
    /// Pending initial reveal; `None` once revealed.
    reveal_at: Option<Duration>,
    page_href: String,
    commands: Vec<HostCommand>,
}

impl<P: Patcher> ViewerCore<P> {
    /// Decode `query`, paint the address-less first frame and schedule the
    /// reveal.
    pub fn boot(query: &str, page_href: &str, config: ViewerConfig, patcher: P) -> Result<Self> {
        config.validate()?;
        let mut state = history::decode_with(
            query,
            DecodeDefaults {
                columns_count: config.default_columns_count,
                columns_width: config.default_columns_width,
            },
        );
        if config.bounds == BoundsPolicy::Clamp {
            state.enforce_bounds();
        }

        let input = config.input_debounce();
        let clock = DeterministicClock::new();
        let mut core = Self {
            render: RenderLoop::new(patcher),
            scroll: ScrollSynchronizer::new(config.scroll_quiet()),
            checker: ReachabilityChecker::new(&config.probe_endpoint),
            url_edits: BTreeMap::new(),
            width_edits: Debounce::new(input),
            column_steps: Debounce::new(input),
            resize: Debounce::new(config.resize_debounce()),
            reveal_at: Some(clock.now().saturating_add(config.reveal_delay())),
            page_href: page_href.to_owned(),
            commands: Vec::new(),
            clock,
            state,
            config,
        };
        tracing::info!(
            target: "colview.render",
            mode = %core.state.display_mode,
            columns = core.state.columns_count,
            width = core.state.columns_width,
            probing = core.checker.is_enabled(),
            "viewer booted"
        );
        core.rerender()?;
        core.probe_all();
        Ok(core)
    }

    // -- time ---------------------------------------------------------------

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Advance the clock by `dt_ms`; negative and non-finite values are
    /// ignored.
    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        self.clock.advance_ms(dt_ms);
    }

    /// Move the clock to an absolute host timestamp. Never goes backwards.
    pub fn set_time_ms(&mut self, ts_ms: f64) {
        if let Some(ts) = duration_from_ms(ts_ms) {
            self.clock.set(ts);
        }
    }

    /// Earliest instant at which [`Self::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.render.scroll_pass_pending() {
            return Some(self.clock.now());
        }
        let others = [
            self.width_edits.deadline(),
            self.column_steps.deadline(),
            self.resize.deadline(),
            self.reveal_at,
        ];
        self.url_edits
            .values()
            .filter_map(Debounce::deadline)
            .chain(others.into_iter().flatten())
            .min()
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub const fn last_tree(&self) -> Option<&Node> {
        self.render.last_tree()
    }

    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        self.reveal_at.is_none()
    }

    #[must_use]
    pub const fn patcher(&self) -> &P {
        self.render.patcher()
    }

    pub fn patcher_mut(&mut self) -> &mut P {
        self.render.patcher_mut()
    }

    /// Drain pending host commands.
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    // -- events -------------------------------------------------------------

    /// Route a fired listener. Scroll and load actions must go through
    /// [`Self::on_scroll`] and [`Self::on_frame_load`].
    pub fn dispatch_action(&mut self, action: UiAction, value: &str) -> Result<()> {
        match UiEvent::from_action(action, value) {
            Some(event) => self.dispatch(event),
            None => {
                tracing::warn!(target: "colview.input", ?action, "action has a dedicated entry point");
                Ok(())
            }
        }
    }

    pub fn dispatch(&mut self, event: UiEvent) -> Result<()> {
        let now = self.clock.now();
        tracing::trace!(target: "colview.input", ?event, "dispatch");
        match event {
            UiEvent::UrlChanged { address, value } => {
                let window = self.config.input_debounce();
                self.url_edits
                    .entry(address)
                    .or_insert_with(|| Debounce::new(window))
                    .push(now, value);
            }
            UiEvent::WidthChanged { value } => {
                self.width_edits.push(now, value);
            }
            UiEvent::ColumnsStepped { delta } => {
                let base = self
                    .column_steps
                    .pending()
                    .copied()
                    .unwrap_or(self.state.columns_count);
                let target = base.saturating_add_signed(delta).clamp(MIN_COLUMNS, MAX_COLUMNS);
                if target == base {
                    tracing::debug!(target: "colview.input", step_target = target, delta, "column step at bound ignored");
                } else {
                    self.column_steps.push(now, target);
                }
            }
            UiEvent::Resized => {
                self.resize.push(now, ());
            }
            UiEvent::WidthTyped { value } => {
                let count = value.chars().count();
                if count != self.state.width_char_count {
                    self.state.width_char_count = count;
                    self.rerender()?;
                }
            }
            UiEvent::PresetChosen { width } => {
                self.state.set_columns_width(width);
                self.persist();
                self.rerender()?;
            }
            UiEvent::DisplayModeChanged { value } => {
                let Some(mode) = DisplayMode::parse(&value) else {
                    tracing::warn!(target: "colview.input", %value, "unknown display mode");
                    return Ok(());
                };
                if self.state.set_display_mode(mode) {
                    self.persist();
                    self.rerender()?;
                    self.probe_all();
                }
            }
        }
        Ok(())
    }

    /// Fire whatever is due: debounced edits, the reveal, then the deferred
    /// scroll pass on column 0.
    pub fn tick<S: ColumnSurface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        let now = self.clock.now();
        let due: Vec<(ColumnAddress, String)> = self
            .url_edits
            .iter_mut()
            .filter_map(|(address, edits)| edits.poll(now).map(|raw| (*address, raw)))
            .collect();
        self.url_edits.retain(|_, edits| edits.is_pending());
        for (address, raw) in due {
            self.apply_url_edit(address, &raw)?;
        }
        if let Some(raw) = self.width_edits.poll(now) {
            self.apply_width_edit(&raw)?;
        }
        if let Some(target) = self.column_steps.poll(now) {
            self.apply_column_step(target)?;
        }
        if self.resize.poll(now).is_some() {
            tracing::debug!(target: "colview.render", "resize settled");
            self.rerender()?;
        }
        if self.reveal_at.is_some_and(|at| now >= at) {
            self.reveal_at = None;
            self.commands.push(HostCommand::MarkLoaded);
            self.rerender()?;
        }
        if self.render.take_scroll_pass() && surface.column_count() > 0 {
            self.scroll
                .sync(surface, 0, self.state.display_mode, now);
        }
        Ok(())
    }

    /// Scroll notification from page column `index`.
    pub fn on_scroll<S: ColumnSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        index: usize,
    ) -> ScrollOutcome {
        self.scroll
            .sync(surface, index, self.state.display_mode, self.clock.now())
    }

    /// A frame fired `load`.
    pub fn on_frame_load(
        &mut self,
        address: ColumnAddress,
        frame_id: &str,
        has_source: bool,
    ) -> FrameLoadOutcome {
        match reload::on_frame_load(&mut self.state.loaded_frames, frame_id, has_source) {
            LoadAction::Ignored => FrameLoadOutcome::Ignored,
            LoadAction::Recorded => FrameLoadOutcome::Recorded,
            LoadAction::ForceReload => FrameLoadOutcome::Reload {
                url: self.state.url_at(address).to_owned(),
            },
        }
    }

    /// Record a finished probe and re-render.
    ///
    /// Results are applied in completion order, even when a newer probe for
    /// the same address is still in flight.
    pub fn apply_probe(&mut self, request: &ProbeRequest, outcome: &ProbeOutcome) -> Result<()> {
        let status = classify(outcome);
        tracing::debug!(
            target: "colview.probe",
            seq = request.seq,
            address = ?request.address,
            target_url = %request.target,
            ?status,
            "probe settled"
        );
        self.state.set_status(request.address, status);
        self.rerender()
    }

    // -- handlers -----------------------------------------------------------

    fn apply_url_edit(&mut self, address: ColumnAddress, raw: &str) -> Result<()> {
        self.commands.push(HostCommand::BlurActive);
        let url = normalize_url(raw);
        self.state.set_url(address, url.clone());
        self.state.clear_status(address);
        self.persist();

        if self.config.production {
            if let Some(href) = protocol_redirect(&self.page_href, &url) {
                tracing::info!(target: "colview.input", %href, "scheme mismatch, navigating");
                self.commands.push(HostCommand::Navigate { href });
                return Ok(());
            }
        }

        self.rerender()?;
        self.commands.push(HostCommand::SetControlValue {
            control_id: crate::view::url_field_id(address),
            value: url.clone(),
        });
        self.probe(address, &url);
        Ok(())
    }

    fn apply_width_edit(&mut self, raw: &str) -> Result<()> {
        self.commands.push(HostCommand::BlurActive);
        match history::parse_positive_prefix(raw) {
            Some(width) => {
                self.state.set_columns_width(width);
                self.persist();
                self.rerender()?;
            }
            None => {
                tracing::debug!(target: "colview.input", %raw, "unparseable width kept previous");
                self.state.width_char_count = self.state.columns_width.to_string().len();
                self.rerender()?;
            }
        }
        self.commands.push(HostCommand::SetControlValue {
            control_id: WIDTH_FIELD_ID.to_owned(),
            value: self.state.columns_width.to_string(),
        });
        Ok(())
    }

    fn apply_column_step(&mut self, target: u32) -> Result<()> {
        self.state.set_columns_count(target);
        self.persist();
        self.rerender()?;
        self.commands.push(HostCommand::BlurActive);
        Ok(())
    }

    // -- helpers ------------------------------------------------------------

    fn persist(&mut self) {
        let query = history::encode(&self.state);
        tracing::trace!(target: "colview.history", %query, "replace history");
        self.commands.push(HostCommand::ReplaceHistory { query });
    }

    /// Render the real state, or its address-less copy until revealed.
    fn rerender(&mut self) -> Result<()> {
        if self.is_revealed() {
            self.render.render(&self.state)?;
        } else {
            self.render.render(&self.state.for_first_paint())?;
        }
        self.prune_loaded_frames();
        Ok(())
    }

    /// Forget frame identifiers the retained tree no longer carries.
    fn prune_loaded_frames(&mut self) {
        let Some(tree) = self.render.last_tree() else {
            return;
        };
        let live: HashSet<&str> = tree
            .find_all(&|n| n.tag == "iframe")
            .into_iter()
            .filter_map(|n| n.id.as_deref())
            .collect();
        let before = self.state.loaded_frames.len();
        self.state.loaded_frames.retain(|id| live.contains(id.as_str()));
        let pruned = before - self.state.loaded_frames.len();
        if pruned > 0 {
            tracing::trace!(target: "colview.reload", pruned, "forgot replaced frames");
        }
    }

    fn probe(&mut self, address: ColumnAddress, target: &str) {
        if let Some(request) = self.checker.request(address, target) {
            tracing::debug!(target: "colview.probe", seq = request.seq, %target, "probe issued");
            self.commands.push(HostCommand::Probe(request));
        }
    }

    /// Probe every address the current mode displays.
    fn probe_all(&mut self) {
        if !self.checker.is_enabled() {
            return;
        }
        let targets: Vec<(ColumnAddress, String)> = match self.state.display_mode {
            DisplayMode::SinglePage => {
                vec![(ColumnAddress::Primary, self.state.primary_url.clone())]
            }
            DisplayMode::MultiPage => (0..self.state.rendered_columns())
                .map(|index| {
                    (
                        ColumnAddress::Indexed(index),
                        self.state.column_url(index).to_owned(),
                    )
                })
                .collect(),
        };
        for (address, target) in targets {
            self.probe(address, &target);
        }
    }

    /// Status currently recorded for page column `index`.
    #[must_use]
    pub fn status_of(&self, index: usize) -> LoadStatus {
        self.state.status_of(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::render::RecordingPatcher;
    use crate::scroll::MemorySurface;

    type Core = ViewerCore<RecordingPatcher>;

    fn boot(query: &str, config: ViewerConfig) -> Core {
        ViewerCore::boot(query, "https://colview.test/", config, RecordingPatcher::default())
            .unwrap()
    }

    fn settle(core: &mut Core, surface: &mut MemorySurface, ms: f64) {
        core.advance_time_ms(ms);
        core.tick(surface).unwrap();
    }

    fn frames(tree: &Node) -> Vec<&Node> {
        tree.find_all(&|n| n.tag == "iframe" && n.id.is_some())
    }

    #[test]
    fn first_paint_has_no_frames_until_reveal() {
        let mut core = boot("?url=https://one.test&columnsCount=3", ViewerConfig::default());
        let mut surface = MemorySurface::new(3, 500.0);
        assert!(frames(core.last_tree().unwrap()).is_empty());

        settle(&mut core, &mut surface, 999.0);
        assert!(!core.is_revealed());

        settle(&mut core, &mut surface, 1.0);
        assert!(core.is_revealed());
        assert_eq!(frames(core.last_tree().unwrap()).len(), 3);
        assert!(core.take_commands().contains(&HostCommand::MarkLoaded));
    }

    #[test]
    fn clamp_policy_bounds_decoded_geometry() {
        let core = boot("?columnsCount=25&columnsWidth=100", ViewerConfig::default());
        assert_eq!(core.state().columns_count, 10);
        assert_eq!(core.state().columns_width, 280);

        let permissive = boot(
            "?columnsCount=25&columnsWidth=100",
            ViewerConfig {
                bounds: BoundsPolicy::Permissive,
                ..ViewerConfig::default()
            },
        );
        assert_eq!(permissive.state().columns_count, 25);
    }

    #[test]
    fn url_edit_runs_handler_steps_in_order() {
        let mut core = boot("", ViewerConfig::default());
        let mut surface = MemorySurface::new(5, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        core.take_commands();

        core.dispatch(UiEvent::UrlChanged {
            address: ColumnAddress::Primary,
            value: "example.com".into(),
        })
        .unwrap();
        settle(&mut core, &mut surface, 50.0);
        assert_eq!(core.state().primary_url, "");

        settle(&mut core, &mut surface, 50.0);
        assert_eq!(core.state().primary_url, "https://example.com");
        assert_eq!(
            core.take_commands(),
            vec![
                HostCommand::BlurActive,
                HostCommand::ReplaceHistory {
                    query: "displayMode=single-page&url=https%3A%2F%2Fexample.com&columnsCount=5&columnsWidth=375"
                        .into(),
                },
                HostCommand::SetControlValue {
                    control_id: "url".into(),
                    value: "https://example.com".into(),
                },
            ]
        );
    }

    #[test]
    fn production_scheme_mismatch_navigates_without_render() {
        let mut core = boot(
            "",
            ViewerConfig {
                production: true,
                ..ViewerConfig::default()
            },
        );
        let mut surface = MemorySurface::new(5, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        core.take_commands();
        let renders = core.patcher().applied.len();

        core.dispatch(UiEvent::UrlChanged {
            address: ColumnAddress::Primary,
            value: "http://plain.test".into(),
        })
        .unwrap();
        settle(&mut core, &mut surface, 100.0);
        let commands = core.take_commands();
        assert_eq!(
            commands.last(),
            Some(&HostCommand::Navigate {
                href: "http://colview.test/".into()
            })
        );
        assert_eq!(core.patcher().applied.len(), renders);
    }

    #[test]
    fn rapid_column_steps_accumulate() {
        let mut core = boot("?columnsCount=3", ViewerConfig::default());
        let mut surface = MemorySurface::new(3, 400.0);
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        settle(&mut core, &mut surface, 40.0);
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        settle(&mut core, &mut surface, 60.0);
        assert_eq!(core.state().columns_count, 3);
        settle(&mut core, &mut surface, 40.0);
        assert_eq!(core.state().columns_count, 5);
        assert_eq!(core.take_commands().last(), Some(&HostCommand::BlurActive));

        core.dispatch(UiEvent::ColumnsStepped { delta: -1 }).unwrap();
        core.dispatch(UiEvent::ColumnsStepped { delta: -1 }).unwrap();
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        settle(&mut core, &mut surface, 100.0);
        assert_eq!(core.state().columns_count, 4);
    }

    #[test]
    fn column_step_past_bound_is_noop() {
        let mut core = boot("?columnsCount=10", ViewerConfig::default());
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        assert!(!core.column_steps.is_pending());
        assert_eq!(core.state().columns_count, 10);

        let mut core = boot("?columnsCount=9", ViewerConfig::default());
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        assert_eq!(core.column_steps.pending(), Some(&10));
    }

    #[test]
    fn edits_to_different_url_fields_both_apply() {
        let mut core = boot(
            "?displayMode=multi-page&columnsCount=2",
            ViewerConfig {
                probe_endpoint: "https://check.test".into(),
                ..ViewerConfig::default()
            },
        );
        let mut surface = MemorySurface::new(2, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        core.take_commands();

        core.dispatch(UiEvent::UrlChanged {
            address: ColumnAddress::Indexed(0),
            value: "a.test".into(),
        })
        .unwrap();
        settle(&mut core, &mut surface, 30.0);
        core.dispatch(UiEvent::UrlChanged {
            address: ColumnAddress::Indexed(1),
            value: "b.test".into(),
        })
        .unwrap();
        settle(&mut core, &mut surface, 200.0);

        assert_eq!(
            core.state().urls,
            vec!["https://a.test".to_owned(), "https://b.test".to_owned()]
        );
        let probed: Vec<_> = core
            .take_commands()
            .into_iter()
            .filter_map(|c| match c {
                HostCommand::Probe(req) => Some(req.address),
                _ => None,
            })
            .collect();
        assert_eq!(
            probed,
            vec![ColumnAddress::Indexed(0), ColumnAddress::Indexed(1)]
        );
        assert!(core.url_edits.is_empty());
    }

    #[test]
    fn edits_to_one_url_field_coalesce() {
        let mut core = boot("", ViewerConfig::default());
        let mut surface = MemorySurface::new(5, 400.0);
        for value in ["e", "ex", "example.com"] {
            core.dispatch(UiEvent::UrlChanged {
                address: ColumnAddress::Primary,
                value: value.into(),
            })
            .unwrap();
            settle(&mut core, &mut surface, 30.0);
        }
        settle(&mut core, &mut surface, 100.0);
        assert_eq!(core.state().primary_url, "https://example.com");
        let histories = core
            .take_commands()
            .into_iter()
            .filter(|c| matches!(c, HostCommand::ReplaceHistory { .. }))
            .count();
        assert_eq!(histories, 1);
    }

    #[test]
    fn blocked_primary_covers_columns_added_later() {
        let mut core = boot(
            "?url=https://blocked.example&columnsCount=2",
            ViewerConfig {
                probe_endpoint: "https://check.test".into(),
                ..ViewerConfig::default()
            },
        );
        let mut surface = MemorySurface::new(2, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        let request = match core.take_commands().into_iter().next() {
            Some(HostCommand::Probe(request)) => request,
            other => panic!("expected probe, got {other:?}"),
        };
        core.apply_probe(
            &request,
            &ProbeOutcome::Response {
                success: true,
                body: r#"{"supportsIframe":false}"#.into(),
            },
        )
        .unwrap();

        core.dispatch(UiEvent::ColumnsStepped { delta: 1 }).unwrap();
        settle(&mut core, &mut surface, 100.0);
        assert_eq!(core.state().columns_count, 3);
        assert_eq!(core.status_of(2), LoadStatus::Blocked);
        let tree = core.last_tree().unwrap();
        let panels = tree.find_all(&|n| n.has_class("column-error"));
        assert_eq!(panels.len(), 3);
        assert!(frames(tree).is_empty());
    }

    #[test]
    fn rerender_forgets_replaced_frame_ids() {
        let mut core = boot("?url=https://one.test&columnsCount=1", ViewerConfig::default());
        let mut surface = MemorySurface::new(1, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        let old_id = frames(core.last_tree().unwrap())[0].id.clone().unwrap();
        assert_eq!(
            core.on_frame_load(ColumnAddress::Primary, &old_id, true),
            FrameLoadOutcome::Recorded
        );

        core.dispatch(UiEvent::PresetChosen { width: 414 }).unwrap();
        assert!(core.state().loaded_frames.is_empty());

        let new_id = frames(core.last_tree().unwrap())[0].id.clone().unwrap();
        assert_ne!(new_id, old_id);
        core.on_frame_load(ColumnAddress::Primary, &new_id, true);
        assert_eq!(core.state().loaded_frames.len(), 1);
    }

    #[test]
    fn width_edit_parses_prefix_and_writes_back() {
        let mut core = boot("", ViewerConfig::default());
        let mut surface = MemorySurface::new(5, 400.0);
        core.dispatch(UiEvent::WidthChanged { value: "5000px".into() }).unwrap();
        settle(&mut core, &mut surface, 100.0);
        assert_eq!(core.state().columns_width, 4000);
        assert!(core.take_commands().contains(&HostCommand::SetControlValue {
            control_id: WIDTH_FIELD_ID.into(),
            value: "4000".into(),
        }));

        core.dispatch(UiEvent::WidthChanged { value: "abc".into() }).unwrap();
        settle(&mut core, &mut surface, 100.0);
        assert_eq!(core.state().columns_width, 4000);
    }

    #[test]
    fn width_typing_rerenders_only_on_length_change() {
        let mut core = boot("", ViewerConfig::default());
        let renders = core.patcher().applied.len();
        core.dispatch(UiEvent::WidthTyped { value: "376".into() }).unwrap();
        assert_eq!(core.patcher().applied.len(), renders);
        core.dispatch(UiEvent::WidthTyped { value: "3760".into() }).unwrap();
        assert_eq!(core.patcher().applied.len(), renders + 1);
        assert_eq!(core.state().width_char_count, 4);
    }

    #[test]
    fn display_mode_change_clears_statuses_and_reprobes() {
        let mut core = boot(
            "?url=https://one.test&urls=https://a.test&columnsCount=2",
            ViewerConfig {
                probe_endpoint: "https://check.test".into(),
                ..ViewerConfig::default()
            },
        );
        let boot_probes = core.take_commands();
        assert!(matches!(
            boot_probes.as_slice(),
            [HostCommand::Probe(ProbeRequest {
                address: ColumnAddress::Primary,
                ..
            })]
        ));
        core.state.set_status(ColumnAddress::Primary, LoadStatus::Blocked);

        core.dispatch(UiEvent::DisplayModeChanged {
            value: "multi-page".into(),
        })
        .unwrap();
        assert!(core.state().load_status.is_empty());
        assert_eq!(core.state().primary_status, LoadStatus::Unknown);
        let probes: Vec<_> = core
            .take_commands()
            .into_iter()
            .filter_map(|c| match c {
                HostCommand::Probe(req) => Some(req.target),
                _ => None,
            })
            .collect();
        assert_eq!(probes, vec!["https://a.test".to_owned()]);
    }

    #[test]
    fn probe_result_renders_panel() {
        let mut core = boot(
            "?displayMode=multi-page&urls=https://blocked.example&columnsCount=1",
            ViewerConfig {
                probe_endpoint: "https://check.test".into(),
                ..ViewerConfig::default()
            },
        );
        let mut surface = MemorySurface::new(1, 400.0);
        settle(&mut core, &mut surface, 1000.0);
        let request = match core.take_commands().into_iter().next() {
            Some(HostCommand::Probe(request)) => request,
            other => panic!("expected probe, got {other:?}"),
        };
        core.apply_probe(
            &request,
            &ProbeOutcome::Response {
                success: true,
                body: r#"{"supportsIframe":false}"#.into(),
            },
        )
        .unwrap();
        assert_eq!(core.status_of(0), LoadStatus::Blocked);
        let text = core.last_tree().unwrap().text_content();
        assert!(text.contains(crate::view::BLOCKED_TEXT));
    }

    #[test]
    fn render_schedules_scroll_pass_on_first_column() {
        let mut core = boot("?url=https://one.test&columnsCount=3", ViewerConfig::default());
        let mut surface = MemorySurface::new(3, 500.0);
        assert_eq!(core.next_deadline(), Some(Duration::ZERO));
        core.tick(&mut surface).unwrap();
        assert_eq!(surface.offsets, vec![0.0, 500.0, 1000.0]);
        assert!(surface.indicator.is_some());
    }

    #[test]
    fn second_load_reassigns_current_url() {
        let mut core = boot("?url=https://one.test", ViewerConfig::default());
        assert_eq!(
            core.on_frame_load(ColumnAddress::Primary, "frame-7", true),
            FrameLoadOutcome::Recorded
        );
        assert_eq!(
            core.on_frame_load(ColumnAddress::Primary, "frame-7", true),
            FrameLoadOutcome::Reload {
                url: "https://one.test".into()
            }
        );
        assert_eq!(
            core.on_frame_load(ColumnAddress::Primary, "frame-8", false),
            FrameLoadOutcome::Ignored
        );
    }

    #[test]
    fn resize_is_debounced() {
        let mut core = boot("", ViewerConfig::default());
        let mut surface = MemorySurface::new(5, 400.0);
        core.tick(&mut surface).unwrap();
        let renders = core.patcher().applied.len();
        core.dispatch(UiEvent::Resized).unwrap();
        settle(&mut core, &mut surface, 20.0);
        core.dispatch(UiEvent::Resized).unwrap();
        settle(&mut core, &mut surface, 49.0);
        assert_eq!(core.patcher().applied.len(), renders);
        settle(&mut core, &mut surface, 1.0);
        assert_eq!(core.patcher().applied.len(), renders + 1);
    }

    #[test]
    fn failed_patch_surfaces_as_error() {
        let mut core = boot("", ViewerConfig::default());
        core.patcher_mut().fail_next = true;
        let err = core
            .dispatch(UiEvent::PresetChosen { width: 414 })
            .unwrap_err();
        assert!(matches!(err, crate::error::ViewerError::Patch { .. }));
        assert_eq!(core.state().columns_width, 414);
    }
}
