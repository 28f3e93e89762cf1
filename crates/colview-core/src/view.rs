#![forbid(unsafe_code)]

//! `State -> Node`: the whole page as a declarative tree.
//!
//! Layout, top to bottom:
//! - header: branding, display-mode switch, primary URL field, column-count
//!   stepper, screen-size field with device presets;
//! - column strip: nav column (single page only), one column per
//!   `columns_count` (capped by [`State::rendered_columns`]), then a trailing
//!   padding node.
//!
//! Building has no side effects beyond drawing fresh frame identifiers from
//! a process-wide counter; every embedded frame gets a new one per build so
//! the reload tracker can tell a reused frame element from a new one.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::{
    ColumnAddress, DisplayMode, LoadStatus, MAX_COLUMNS, MAX_WIDTH, MIN_COLUMNS, MIN_WIDTH, State,
};
use crate::tree::{DomEvent, Node, UiAction};

pub const APP_ROOT_ID: &str = "app";
pub const PRIMARY_URL_FIELD_ID: &str = "url";
pub const WIDTH_FIELD_ID: &str = "columnsWidth";
pub const URL_PLACEHOLDER: &str = "https://example.com";

pub const BLOCKED_TITLE: &str = "This page refuses to be displayed here";
pub const BLOCKED_TEXT: &str = "Embedding is disallowed by the target site.";
pub const UNREACHABLE_TITLE: &str = "This page could not be reached";
pub const UNREACHABLE_TEXT: &str = "Please check the URL.";

/// A screen-size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub name: &'static str,
    pub width: u32,
}

pub const DEVICES: [Device; 5] = [
    Device {
        name: "iPhone 5/SE",
        width: 320,
    },
    Device {
        name: "Moto G / Galaxy S5",
        width: 360,
    },
    Device {
        name: "iPhone 6/7/8/X",
        width: 375,
    },
    Device {
        name: "iPhone 6/7/8 Plus",
        width: 414,
    },
    Device {
        name: "iPad",
        width: 768,
    },
];

/// Preset name for `width`, or `Custom`.
#[must_use]
pub fn device_name(width: u32) -> &'static str {
    DEVICES
        .iter()
        .find(|device| device.width == width)
        .map_or("Custom", |device| device.name)
}

/// DOM id of the URL field editing `address`.
#[must_use]
pub fn url_field_id(address: ColumnAddress) -> String {
    match address {
        ColumnAddress::Primary => PRIMARY_URL_FIELD_ID.to_owned(),
        ColumnAddress::Indexed(index) => format!("column-url-{index}"),
    }
}

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

fn next_frame_id() -> String {
    format!("frame-{}", NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
}

/// Build the full page tree for `state`.
#[must_use]
pub fn view(state: &State) -> Node {
    Node::new("div")
        .id(APP_ROOT_ID)
        .child(header(state))
        .child(columns(state))
}

fn icon(name: &str) -> Node {
    Node::new("svg")
        .class("icon")
        .child(Node::new("use").attr("xlink:href", format!("#icon-{name}")))
}

fn header_block(icon_name: &str, content: Node) -> Node {
    Node::new("div")
        .class("header-block")
        .child(Node::new("div").class("header-block--icon").child(icon(icon_name)))
        .child(content)
}

fn header(state: &State) -> Node {
    Node::new("header")
        .child(branding())
        .child(display_mode_switch(state))
        .child(primary_url_field(state))
        .child(columns_stepper(state))
        .child(screen_size_field(state))
}

fn link(href: &'static str, label: &'static str) -> Node {
    Node::new("a")
        .attr("href", href)
        .attr("target", "_blank")
        .text(label)
}

fn branding() -> Node {
    Node::new("div")
        .class("header-block")
        .class("header-block__logo")
        .child(Node::new("div").class("header-logo--overlay"))
        .child(Node::new("div").class("header-logo").text("Column View"))
        .child(
            Node::new("div")
                .class("header-logo--details")
                .child(Node::new("p").text(
                    "Column view is a tool that helps you view the mobile version of your \
                     website directly in multiple columns or helps you check multiple pages at once.",
                ))
                .child(
                    Node::new("div")
                        .text("Design")
                        .child(link("https://twitter.com/adriengervaix", "@adriengervaix"))
                        .child(Node::new("br"))
                        .text("Development")
                        .child(link("https://twitter.com/AlexandreDemode", "@AlexandreDemode")),
                )
                .child(
                    Node::new("div")
                        .class("header-logo--see-on-github")
                        .text("Open Source under MIT License")
                        .child(link("https://github.com/Alex-D/Column-View", "See on GitHub")),
                ),
        )
}

fn mode_radio(state: &State, mode: DisplayMode, label: &str) -> [Node; 2] {
    let id = format!("switch-{}", mode.as_str());
    [
        Node::new("input")
            .class("header-switch--radio")
            .id(id.clone())
            .attr("type", "radio")
            .attr("name", "display-mode")
            .attr("value", mode.as_str())
            .attr("checked", state.display_mode == mode)
            .on(DomEvent::Change, UiAction::DisplayModeChange),
        Node::new("label")
            .class("header-switch--item")
            .attr("for", id)
            .text(label),
    ]
}

fn display_mode_switch(state: &State) -> Node {
    let radios = mode_radio(state, DisplayMode::SinglePage, "Single page")
        .into_iter()
        .chain(mode_radio(state, DisplayMode::MultiPage, "Multi page"));
    header_block(
        "type",
        Node::new("div")
            .class("header-block--content")
            .child(Node::new("div").class("header-block--title").text("Type"))
            .child(Node::new("div").class("header-switch").children(radios)),
    )
}

fn url_input(address: ColumnAddress, value: &str, disabled: bool) -> Node {
    let id = url_field_id(address);
    Node::new("input")
        .id(id.clone())
        .attr("type", "url")
        .attr("name", id)
        .attr("value", value)
        .attr("placeholder", URL_PLACEHOLDER)
        .attr("disabled", disabled)
        .on(DomEvent::Change, UiAction::UrlChange { address })
}

fn primary_url_field(state: &State) -> Node {
    let multi = state.display_mode == DisplayMode::MultiPage;
    header_block(
        "url",
        Node::new("div")
            .class("header-block--content")
            .child(
                Node::new("label")
                    .class("header-block--title")
                    .attr("for", PRIMARY_URL_FIELD_ID)
                    .text("URL"),
            )
            .child(
                Node::new("div")
                    .class("header-block--field")
                    .child(url_input(ColumnAddress::Primary, &state.primary_url, multi)),
            ),
    )
    .class("header-block__focus-within")
    .class_if("header-block__disabled", multi)
}

fn columns_stepper(state: &State) -> Node {
    let count = state.columns_count;
    header_block(
        "column-count",
        Node::new("div")
            .class("header-block--content")
            .child(Node::new("div").class("header-block--title").text("Column count"))
            .child(
                Node::new("div")
                    .class("header-block--field")
                    .child(
                        Node::new("button")
                            .attr("disabled", count <= MIN_COLUMNS)
                            .on(
                                DomEvent::Click,
                                UiAction::ColumnsStep { delta: -1 },
                            )
                            .text("\u{2212}"),
                    )
                    .child(Node::new("span").class("column-count").text(count.to_string()))
                    .child(
                        Node::new("button")
                            .attr("disabled", count >= MAX_COLUMNS)
                            .on(
                                DomEvent::Click,
                                UiAction::ColumnsStep { delta: 1 },
                            )
                            .text("+"),
                    ),
            ),
    )
}

fn screen_size_field(state: &State) -> Node {
    let presets = DEVICES.iter().map(|device| {
        Node::new("div")
            .class("header-block--dropdown-item")
            .on(
                DomEvent::Click,
                UiAction::PresetPick {
                    width: device.width,
                },
            )
            .child(Node::new("div").text(device.name))
            .child(
                Node::new("div")
                    .class("header-block--dropdown-item-details")
                    .text(format!("{}px", device.width)),
            )
    });

    header_block(
        "screen-size",
        Node::new("div")
            .class("header-block--content")
            .child(
                Node::new("label")
                    .class("header-block--title")
                    .attr("for", WIDTH_FIELD_ID)
                    .text("Screen size"),
            )
            .child(
                Node::new("div")
                    .class("header-block--field")
                    .class("header-block--field-screen-size")
                    .child(
                        Node::new("input")
                            .id(WIDTH_FIELD_ID)
                            .attr("type", "number")
                            .attr("name", WIDTH_FIELD_ID)
                            .attr("min", MIN_WIDTH)
                            .attr("max", MAX_WIDTH)
                            .attr("value", state.columns_width.to_string())
                            .attr(
                                "style",
                                format!("--input-content-width: {}", state.width_char_count),
                            )
                            .on(DomEvent::Change, UiAction::WidthChange)
                            .on(DomEvent::Input, UiAction::WidthInput),
                    )
                    .child(
                        Node::new("input")
                            .attr(
                                "value",
                                format!("px \u{2014} {}", device_name(state.columns_width)),
                            )
                            .attr("disabled", true),
                    ),
            ),
    )
    .class("header-block__focus-within")
    .child(Node::new("div").class("header-block--dropdown").children(presets))
}

fn columns(state: &State) -> Node {
    let multi = state.display_mode == DisplayMode::MultiPage;
    let mut strip = Node::new("div")
        .class("columns")
        .class_if("columns__multi-page", multi)
        .attr(
            "style",
            format!(
                "--columns-count: {}; --columns-width: {}px",
                state.rendered_columns(),
                state.columns_width
            ),
        );

    if !multi {
        strip = strip.child(nav_column(state));
    }
    strip
        .children((0..state.rendered_columns()).map(|index| column(state, index)))
        .child(Node::new("div").class("fix-for-horizontal-scroll-right-padding"))
}

fn nav_column(state: &State) -> Node {
    let placeholders =
        (0..state.rendered_columns()).map(|_| Node::new("div").class("nav-column--placeholder"));
    let mut container = Node::new("div").class("nav-column--container");
    if !state.primary_url.is_empty() {
        container = container.child(
            Node::new("iframe")
                .attr("src", state.primary_url.as_str())
                .attr("frameborder", "0")
                .attr("scrolling", "no"),
        );
    }
    Node::new("div")
        .class("column")
        .class("nav-column")
        .child(container.child(Node::new("div").class("nav-column--placeholders").children(placeholders)))
}

fn column(state: &State, index: usize) -> Node {
    let address = state.address_of(index);
    let url = state.column_url(index);
    let mut node = Node::new("div")
        .class("column")
        .on(DomEvent::Scroll, UiAction::ColumnScroll { index });

    if state.display_mode == DisplayMode::MultiPage {
        node = node.child(column_url_field(address, url));
    }
    if url.is_empty() {
        return node;
    }
    match state.status_of(index) {
        status if status.is_error() => node.child(error_panel(status)),
        _ => node.child(
            Node::new("iframe")
                .id(next_frame_id())
                .attr("src", url)
                .attr("frameborder", "0")
                .attr("scrolling", "no")
                .on(DomEvent::Load, UiAction::FrameLoad { address }),
        ),
    }
}

fn column_url_field(address: ColumnAddress, url: &str) -> Node {
    let id = url_field_id(address);
    Node::new("div")
        .class("column-url")
        .child(Node::new("div").class("column-url--icon").child(icon("url")))
        .child(
            Node::new("div")
                .class("column-url--content")
                .child(
                    Node::new("label")
                        .class("column-url--title")
                        .attr("for", id)
                        .text("URL"),
                )
                .child(
                    Node::new("div")
                        .class("column-url--field")
                        .child(url_input(address, url, false)),
                ),
        )
}

fn error_panel(status: LoadStatus) -> Node {
    let (title, text) = match status {
        LoadStatus::Blocked => (BLOCKED_TITLE, BLOCKED_TEXT),
        _ => (UNREACHABLE_TITLE, UNREACHABLE_TEXT),
    };
    Node::new("div")
        .class("column-error")
        .class_if("column-error__blocked", status == LoadStatus::Blocked)
        .child(Node::new("div").class("column-error--title").text(title))
        .child(Node::new("p").class("column-error--text").text(text))
}
