#![forbid(unsafe_code)]

//! Query-string codec mirroring [`State`] into the page URL.
//!
//! | key | meaning | default |
//! |---|---|---|
//! | `displayMode` | `single-page` \| `multi-page` | `single-page` |
//! | `url` | target address, single-page mode | `""` |
//! | `urls` | repeated, one per column, multi-page mode | `[]` |
//! | `columnsCount` | integer | 5 |
//! | `columnsWidth` | integer (px) | 375 |
//!
//! Decoding never fails: unknown or unparseable values fall back to the
//! defaults. Encoding is what the host passes to `history.replaceState`;
//! no history entry is ever pushed.

use url::form_urlencoded;

use crate::state::{DEFAULT_COLUMNS, DEFAULT_WIDTH, DisplayMode, State};

pub const KEY_DISPLAY_MODE: &str = "displayMode";
pub const KEY_URL: &str = "url";
pub const KEY_URLS: &str = "urls";
pub const KEY_COLUMNS_COUNT: &str = "columnsCount";
pub const KEY_COLUMNS_WIDTH: &str = "columnsWidth";

/// Fallbacks used when a numeric parameter is missing or unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeDefaults {
    pub columns_count: u32,
    pub columns_width: u32,
}

impl Default for DecodeDefaults {
    fn default() -> Self {
        Self {
            columns_count: DEFAULT_COLUMNS,
            columns_width: DEFAULT_WIDTH,
        }
    }
}

/// Decode a query string (with or without the leading `?`) using the
/// built-in defaults.
#[must_use]
pub fn decode(query: &str) -> State {
    decode_with(query, DecodeDefaults::default())
}

/// Decode a query string. Geometry is not range-checked here.
#[must_use]
pub fn decode_with(query: &str, defaults: DecodeDefaults) -> State {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut display_mode = None;
    let mut primary_url = None;
    let mut urls = Vec::new();
    let mut columns_count = None;
    let mut columns_width = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            KEY_DISPLAY_MODE if display_mode.is_none() => {
                display_mode = Some(DisplayMode::parse(&value).unwrap_or_default());
            }
            KEY_URL if primary_url.is_none() => primary_url = Some(value.into_owned()),
            KEY_URLS => urls.push(value.into_owned()),
            KEY_COLUMNS_COUNT if columns_count.is_none() => {
                columns_count = Some(parse_positive_prefix(&value));
            }
            KEY_COLUMNS_WIDTH if columns_width.is_none() => {
                columns_width = Some(parse_positive_prefix(&value));
            }
            _ => {}
        }
    }

    let mut state = State::new(
        display_mode.unwrap_or_default(),
        columns_count.flatten().unwrap_or(defaults.columns_count),
        columns_width.flatten().unwrap_or(defaults.columns_width),
    );
    state.primary_url = primary_url.unwrap_or_default();
    state.urls = urls;
    tracing::debug!(
        target: "colview.history",
        display_mode = %state.display_mode,
        columns_count = state.columns_count,
        columns_width = state.columns_width,
        urls = state.urls.len(),
        "decoded query"
    );
    state
}

/// Encode the shareable part of `state` as a query string (no leading `?`).
#[must_use]
pub fn encode(state: &State) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    out.append_pair(KEY_DISPLAY_MODE, state.display_mode.as_str());
    match state.display_mode {
        DisplayMode::SinglePage => {
            out.append_pair(KEY_URL, &state.primary_url);
        }
        DisplayMode::MultiPage => {
            for url in &state.urls {
                out.append_pair(KEY_URLS, url);
            }
        }
    }
    out.append_pair(KEY_COLUMNS_COUNT, &state.columns_count.to_string());
    out.append_pair(KEY_COLUMNS_WIDTH, &state.columns_width.to_string());
    out.finish()
}

/// Leading-integer parse: optional whitespace and `+`, then digits; any
/// trailing garbage is ignored. Zero, negatives and non-numbers yield `None`.
pub(crate) fn parse_positive_prefix(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(idx, _)| idx);
    digits[..end].parse::<u32>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn empty_query_decodes_to_defaults() {
        let state = decode("");
        assert_eq!(state.display_mode, DisplayMode::SinglePage);
        assert_eq!(state.primary_url, "");
        assert!(state.urls.is_empty());
        assert_eq!(state.columns_count, 5);
        assert_eq!(state.columns_width, 375);
    }

    #[test]
    fn decodes_multi_page_example() {
        let state = decode(
            "?displayMode=multi-page&urls=https://a.test&urls=https://b.test&columnsCount=2&columnsWidth=400",
        );
        assert_eq!(state.display_mode, DisplayMode::MultiPage);
        assert_eq!(state.urls, vec!["https://a.test", "https://b.test"]);
        assert_eq!(state.columns_count, 2);
        assert_eq!(state.columns_width, 400);
        assert_eq!(state.width_char_count, 3);
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let state = decode("columnsCount=abc&columnsWidth=");
        assert_eq!(state.columns_count, 5);
        assert_eq!(state.columns_width, 375);

        let state = decode("columnsCount=0&columnsWidth=-300");
        assert_eq!(state.columns_count, 5);
        assert_eq!(state.columns_width, 375);
    }

    #[test]
    fn numeric_prefix_is_accepted() {
        let state = decode("columnsCount=3cols&columnsWidth=%20414px");
        assert_eq!(state.columns_count, 3);
        assert_eq!(state.columns_width, 414);
    }

    #[test]
    fn out_of_range_values_survive_decode() {
        let state = decode("columnsCount=25&columnsWidth=9000");
        assert_eq!(state.columns_count, 25);
        assert_eq!(state.columns_width, 9000);
    }

    #[test]
    fn unknown_display_mode_falls_back() {
        assert_eq!(decode("displayMode=grid").display_mode, DisplayMode::SinglePage);
    }

    #[test]
    fn custom_defaults_apply() {
        let state = decode_with(
            "",
            DecodeDefaults {
                columns_count: 3,
                columns_width: 420,
            },
        );
        assert_eq!((state.columns_count, state.columns_width), (3, 420));
    }

    #[test]
    fn encode_single_page_writes_url_only() {
        let mut state = State::default();
        state.primary_url = "https://example.com/a?b=c".into();
        state.urls = vec!["https://ignored.test".into()];
        assert_eq!(
            encode(&state),
            "displayMode=single-page&url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc&columnsCount=5&columnsWidth=375"
        );
    }

    #[test]
    fn encode_multi_page_repeats_urls_preserving_empties() {
        let mut state = State::new(DisplayMode::MultiPage, 3, 320);
        state.urls = vec!["https://a.test".into(), String::new(), "https://c.test".into()];
        let query = encode(&state);
        assert_eq!(
            query,
            "displayMode=multi-page&urls=https%3A%2F%2Fa.test&urls=&urls=https%3A%2F%2Fc.test&columnsCount=3&columnsWidth=320"
        );
        assert_eq!(decode(&query).urls, state.urls);
    }

    #[test]
    fn single_page_round_trip() {
        let mut state = State::new(DisplayMode::SinglePage, 7, 768);
        state.primary_url = "https://example.com".into();
        assert_eq!(decode(&encode(&state)), state);
    }
}
