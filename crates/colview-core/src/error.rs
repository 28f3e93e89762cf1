use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Failures that reach the host.
///
/// Malformed query parameters, blocked embeds and unreachable sites are not
/// errors: they degrade to defaults or to a per-column panel.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("config JSON error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("patch failed: {message}")]
    Patch { message: String },

    #[error("host error: {message}")]
    Host { message: String },
}

impl ViewerError {
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn patch(message: impl Into<String>) -> Self {
        Self::Patch {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }
}
