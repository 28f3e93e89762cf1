#![forbid(unsafe_code)]

//! Tunable parameters for the viewer, loaded from JSON at startup.
//!
//! The page hands a JSON object to the WASM entry point; every field is
//! optional and [`ViewerConfig::default`] reproduces the built-in constants.
//!
//! ```json
//! { "probe_endpoint": "https://embed-check.example/api", "production": true }
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};
use crate::state::{DEFAULT_COLUMNS, DEFAULT_WIDTH, MAX_COLUMNS, MAX_WIDTH, MIN_COLUMNS, MIN_WIDTH};

/// Where column geometry bounds are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Clamp decoded geometry into range at boot.
    #[default]
    Clamp,
    /// Keep whatever the query string carried; only UI handlers clamp.
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_columns_count: u32,
    pub default_columns_width: u32,
    /// Base URL of the embeddability lookup service. Empty disables probing.
    pub probe_endpoint: String,
    pub input_debounce_ms: u64,
    pub resize_debounce_ms: u64,
    pub scroll_quiet_ms: u64,
    pub reveal_delay_ms: u64,
    /// Enables protocol-matching navigation after URL edits.
    pub production: bool,
    pub bounds: BoundsPolicy,
    /// Console log level for the web host (`trace` .. `error`).
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_columns_count: DEFAULT_COLUMNS,
            default_columns_width: DEFAULT_WIDTH,
            probe_endpoint: String::new(),
            input_debounce_ms: 100,
            resize_debounce_ms: 50,
            scroll_quiet_ms: 100,
            reveal_delay_ms: 1000,
            production: false,
            bounds: BoundsPolicy::Clamp,
            log_level: "info".to_owned(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON config. An empty string yields defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("input_debounce_ms", self.input_debounce_ms),
            ("resize_debounce_ms", self.resize_debounce_ms),
            ("scroll_quiet_ms", self.scroll_quiet_ms),
        ] {
            if value == 0 {
                return Err(ViewerError::invalid_config(format!("{name} must be > 0")));
            }
        }
        if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&self.default_columns_count) {
            return Err(ViewerError::invalid_config(format!(
                "default_columns_count {} outside {MIN_COLUMNS}..={MAX_COLUMNS}",
                self.default_columns_count
            )));
        }
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.default_columns_width) {
            return Err(ViewerError::invalid_config(format!(
                "default_columns_width {} outside {MIN_WIDTH}..={MAX_WIDTH}",
                self.default_columns_width
            )));
        }
        Ok(())
    }

    #[must_use]
    pub const fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }

    #[must_use]
    pub const fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    #[must_use]
    pub const fn scroll_quiet(&self) -> Duration {
        Duration::from_millis(self.scroll_quiet_ms)
    }

    #[must_use]
    pub const fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}
