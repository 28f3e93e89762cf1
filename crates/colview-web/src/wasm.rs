#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the Column View page.
//!
//! This module wraps [`colview_core::ViewerCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use colview_core::history;
use colview_core::{
    ColumnSurface, FrameLoadOutcome, HostCommand, NavIndicator, Node, Patcher, ProbeOutcome,
    ProbeRequest, UiAction, UiEvent, ViewerConfig, ViewerCore, ViewerError,
};
use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use js_sys::{Function, JSON, Reflect};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlIFrameElement, HtmlInputElement, Response,
};
use web_time::Instant;

use crate::{console, history_url, log_level_filter, status_name, timer_delay_ms};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn to_js_error(err: ViewerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn host_error(value: &JsValue) -> ViewerError {
    ViewerError::host(describe(value))
}

// -- patcher --------------------------------------------------------------

/// Bridge to the page's virtual-DOM adapter.
struct JsPatcher {
    patch_fn: Function,
    dispatch: JsValue,
}

fn tree_to_js(node: &Node) -> colview_core::Result<JsValue> {
    let json = serde_json::to_string(node).map_err(|err| ViewerError::patch(err.to_string()))?;
    JSON::parse(&json).map_err(|err| ViewerError::patch(describe(&err)))
}

impl Patcher for JsPatcher {
    fn patch(&mut self, previous: Option<&Node>, next: &Node) -> colview_core::Result<()> {
        let previous = match previous {
            Some(tree) => tree_to_js(tree)?,
            None => JsValue::NULL,
        };
        let next = tree_to_js(next)?;
        self.patch_fn
            .call3(&JsValue::NULL, &previous, &next, &self.dispatch)
            .map(|_| ())
            .map_err(|err| ViewerError::patch(describe(&err)))
    }
}

// -- column surface -------------------------------------------------------

/// Page columns captured for one synchronization pass.
struct DomSurface {
    app: Option<Element>,
    columns: Vec<Element>,
}

impl DomSurface {
    fn capture(document: &Document) -> Self {
        let columns = document
            .query_selector_all(".column:not(.nav-column)")
            .map(|list| {
                (0..list.length())
                    .filter_map(|i| list.get(i))
                    .filter_map(|node| node.dyn_into::<Element>().ok())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            app: document.get_element_by_id(colview_core::view::APP_ROOT_ID),
            columns,
        }
    }
}

impl ColumnSurface for DomSurface {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn scroll_top(&self, index: usize) -> f64 {
        self.columns
            .get(index)
            .map_or(0.0, |column| f64::from(column.scroll_top()))
    }

    fn set_scroll_top(&mut self, index: usize, value: f64) {
        if let Some(column) = self.columns.get(index) {
            column.set_scroll_top(value.round() as i32);
        }
    }

    fn column_height(&self, index: usize) -> f64 {
        self.columns
            .get(index)
            .map_or(0.0, |column| column.get_bounding_client_rect().height())
    }

    fn set_nav_indicator(&mut self, indicator: NavIndicator) {
        if let Some(app) = &self.app {
            if let Err(err) = app.set_attribute("style", &indicator.to_style()) {
                warn!(target: "colview.scroll", err = %host_error(&err), "nav indicator not written");
            }
        }
    }
}

// -- driver ---------------------------------------------------------------

struct Inner {
    core: ViewerCore<JsPatcher>,
    document: Document,
    epoch: Instant,
    timer: Option<Timeout>,
    resize: Option<EventListener>,
}

impl Inner {
    fn sync_clock(&mut self) {
        let elapsed = self.epoch.elapsed();
        self.core.set_time_ms(elapsed.as_secs_f64() * 1000.0);
    }
}

type Shared = Rc<RefCell<Inner>>;

/// Run `f` against the core, then carry out its commands and re-arm the
/// timer. Commands run after the borrow is released: blurring a field can
/// fire `change` synchronously.
fn drive(shared: &Shared, f: impl FnOnce(&mut Inner) -> colview_core::Result<()>) {
    let commands = {
        let Ok(mut inner) = shared.try_borrow_mut() else {
            warn!(target: "colview.input", "viewer busy, event dropped");
            return;
        };
        inner.sync_clock();
        if let Err(err) = f(&mut inner) {
            warn!(target: "colview.render", %err, "viewer update failed");
        }
        inner.core.take_commands()
    };
    execute(shared, commands);
    schedule(shared);
}

fn schedule(shared: &Shared) {
    let Ok(mut inner) = shared.try_borrow_mut() else {
        return;
    };
    let Some(deadline) = inner.core.next_deadline() else {
        inner.timer = None;
        return;
    };
    let delay = timer_delay_ms(inner.core.now(), deadline);
    let weak = Rc::downgrade(shared);
    inner.timer = Some(Timeout::new(delay, move || {
        if let Some(shared) = weak.upgrade() {
            drive(&shared, |inner| {
                let mut surface = DomSurface::capture(&inner.document);
                inner.core.tick(&mut surface)
            });
        }
    }));
}

fn execute(shared: &Shared, commands: Vec<HostCommand>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    for command in commands {
        trace!(target: "colview.input", ?command, "host command");
        let result = match command {
            HostCommand::ReplaceHistory { query } => replace_history(&window, &query),
            HostCommand::Navigate { href } => window.location().replace(&href),
            HostCommand::BlurActive => match document
                .active_element()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                Some(el) => el.blur(),
                None => Ok(()),
            },
            HostCommand::SetControlValue { control_id, value } => {
                if let Some(input) = document
                    .get_element_by_id(&control_id)
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                {
                    input.set_value(&value);
                }
                Ok(())
            }
            HostCommand::Probe(request) => {
                spawn_local(run_probe(Rc::downgrade(shared), request));
                Ok(())
            }
            HostCommand::MarkLoaded => match document.body() {
                Some(body) => body.class_list().add_1("loaded"),
                None => Ok(()),
            },
        };
        if let Err(err) = result {
            warn!(target: "colview.input", err = %host_error(&err), "host command failed");
        }
    }
}

fn replace_history(window: &web_sys::Window, query: &str) -> Result<(), JsValue> {
    let location = window.location();
    let url = history_url(&location.origin()?, &location.pathname()?, query);
    window
        .history()?
        .replace_state_with_url(&JsValue::NULL, "", Some(&url))
}

async fn run_probe(weak: Weak<RefCell<Inner>>, request: ProbeRequest) {
    let outcome = match fetch_text(&request.endpoint).await {
        Ok((success, body)) => ProbeOutcome::Response { success, body },
        Err(err) => ProbeOutcome::TransportError(describe(&err)),
    };
    if let Some(shared) = weak.upgrade() {
        drive(&shared, |inner| inner.core.apply_probe(&request, &outcome));
    }
}

async fn fetch_text(endpoint: &str) -> Result<(bool, String), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(endpoint))
        .await?
        .dyn_into()?;
    let success = response.ok();
    let body = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .unwrap_or_default();
    Ok((success, body))
}

/// Route one fired listener from the patch adapter.
fn on_dom_event(shared: &Shared, action_json: &str, event: &Event) {
    let action: UiAction = match serde_json::from_str(action_json) {
        Ok(action) => action,
        Err(err) => {
            warn!(target: "colview.input", %err, action_json, "unreadable action");
            return;
        }
    };
    let target = event.target();
    match action {
        UiAction::ColumnScroll { index } => drive(shared, |inner| {
            let mut surface = DomSurface::capture(&inner.document);
            inner.core.on_scroll(&mut surface, index);
            Ok(())
        }),
        UiAction::FrameLoad { address } => {
            let Some(frame) = target.and_then(|t| t.dyn_into::<HtmlIFrameElement>().ok()) else {
                return;
            };
            let has_source = frame.get_attribute("src").is_some_and(|src| !src.is_empty());
            let frame_id = frame.id();
            drive(shared, |inner| {
                if let FrameLoadOutcome::Reload { url } =
                    inner.core.on_frame_load(address, &frame_id, has_source)
                {
                    debug!(target: "colview.reload", frame_id = %frame_id, %url, "reassigning frame address");
                    frame.set_src(&url);
                }
                Ok(())
            });
        }
        other => {
            let value = target
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();
            drive(shared, |inner| inner.core.dispatch_action(other, &value));
        }
    }
}

// -- exports --------------------------------------------------------------

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Column View bound to the current page.
#[wasm_bindgen]
pub struct ColumnViewer {
    shared: Shared,
}

#[wasm_bindgen]
impl ColumnViewer {
    /// Boot from `location.search`.
    ///
    /// `patch(previous, next, dispatch)` applies a view tree (JSON object,
    /// `previous` is `null` on the first call) and wires each declared
    /// listener to `dispatch(JSON.stringify(action), event)`. `config` is a
    /// JSON object; pass `""` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(patch: Function, config: &str) -> Result<ColumnViewer, JsValue> {
        install_panic_hook();
        let config = ViewerConfig::from_json_str(config).map_err(to_js_error)?;
        console::init(log_level_filter(&config.log_level));

        let window = web_sys::window().ok_or_else(|| to_js_error(ViewerError::host("no window")))?;
        let document = window
            .document()
            .ok_or_else(|| to_js_error(ViewerError::host("no document")))?;
        let location = window.location();
        let query = location.search()?;
        let href = location.href()?;

        let slot: Rc<RefCell<Weak<RefCell<Inner>>>> = Rc::default();
        let dispatch_slot = Rc::clone(&slot);
        let dispatch = Closure::<dyn FnMut(String, Event)>::new(move |action: String, event: Event| {
            let shared = dispatch_slot.borrow().upgrade();
            if let Some(shared) = shared {
                on_dom_event(&shared, &action, &event);
            }
        })
        .into_js_value();

        let core = ViewerCore::boot(
            &query,
            &href,
            config,
            JsPatcher {
                patch_fn: patch,
                dispatch,
            },
        )
        .map_err(to_js_error)?;

        let shared = Rc::new(RefCell::new(Inner {
            core,
            document,
            epoch: Instant::now(),
            timer: None,
            resize: None,
        }));
        *slot.borrow_mut() = Rc::downgrade(&shared);

        let weak = Rc::downgrade(&shared);
        let resize = EventListener::new(&window, "resize", move |_| {
            if let Some(shared) = weak.upgrade() {
                drive(&shared, |inner| inner.core.dispatch(UiEvent::Resized));
            }
        });
        shared.borrow_mut().resize = Some(resize);

        let commands = shared.borrow_mut().core.take_commands();
        execute(&shared, commands);
        schedule(&shared);
        Ok(Self { shared })
    }

    /// Query string the viewer currently persists.
    #[wasm_bindgen(js_name = currentQuery)]
    pub fn current_query(&self) -> String {
        self.shared
            .try_borrow()
            .map(|inner| history::encode(inner.core.state()))
            .unwrap_or_default()
    }

    /// `ok`, `blocked`, `unreachable` or `unknown` for page column `index`.
    #[wasm_bindgen(js_name = columnStatus)]
    pub fn column_status(&self, index: usize) -> String {
        self.shared
            .try_borrow()
            .map(|inner| status_name(inner.core.status_of(index)).to_owned())
            .unwrap_or_default()
    }

    /// Drop the resize listener and any armed timer.
    pub fn destroy(&self) {
        if let Ok(mut inner) = self.shared.try_borrow_mut() {
            inner.timer = None;
            inner.resize = None;
        }
    }
}
