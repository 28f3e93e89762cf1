#![forbid(unsafe_code)]

//! User input: decoding DOM actions into events, and value normalization.
//!
//! The host reports a fired listener as its [`UiAction`] plus the event
//! target's current `value`. [`UiEvent::from_action`] turns that pair into a
//! typed event for [`crate::ViewerCore::dispatch`]. Scroll and frame-load
//! actions are not user edits and have dedicated entry points on the core.

use url::Url;

use crate::state::ColumnAddress;
use crate::tree::UiAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A URL field committed a new value.
    UrlChanged { address: ColumnAddress, value: String },
    /// Width field committed (`change`).
    WidthChanged { value: String },
    /// Width field keystroke (`input`).
    WidthTyped { value: String },
    PresetChosen { width: u32 },
    /// Stepper click, relative to the count the viewer is heading for.
    ColumnsStepped { delta: i32 },
    DisplayModeChanged { value: String },
    /// Window resized.
    Resized,
}

impl UiEvent {
    /// Pair a fired listener with the target's value.
    #[must_use]
    pub fn from_action(action: UiAction, value: &str) -> Option<Self> {
        let value = value.to_owned();
        match action {
            UiAction::UrlChange { address } => Some(Self::UrlChanged { address, value }),
            UiAction::WidthChange => Some(Self::WidthChanged { value }),
            UiAction::WidthInput => Some(Self::WidthTyped { value }),
            UiAction::PresetPick { width } => Some(Self::PresetChosen { width }),
            UiAction::ColumnsStep { delta } => Some(Self::ColumnsStepped { delta }),
            UiAction::DisplayModeChange => Some(Self::DisplayModeChanged { value }),
            UiAction::ColumnScroll { .. } | UiAction::FrameLoad { .. } => None,
        }
    }

}

/// Normalize a typed address: trim, and prefix `https://` unless the value
/// already starts with `http`. Blank input stays blank.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    }
}

/// Page address to navigate to when the page scheme differs from `url`'s.
///
/// Returns `None` when the schemes already match or either side cannot be
/// interpreted.
#[must_use]
pub fn protocol_redirect(page_href: &str, url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    let mut page = Url::parse(page_href).ok()?;
    if page.scheme() == scheme {
        return None;
    }
    page.set_scheme(scheme).ok()?;
    Some(page.into())
}
