//! Shared primitives used across PageGlow crates.

use thiserror::Error;

/// Result alias used across the workspace.
pub type PageResult<T> = Result<T, PageError>;

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("unsupported selector `{selector}`: {reason}")]
    UnsupportedSelector { selector: String, reason: String },
    #[error("invalid page url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to read config {path}: {reason}")]
    ConfigRead { path: String, reason: String },
    #[error("failed to parse config: {0}")]
    ConfigParse(String),
    #[error("invalid config value for `{key}`: {reason}")]
    ConfigValue { key: &'static str, reason: String },
}

impl PageError {
    pub fn unsupported_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedSelector { .. } => "css.unsupported_selector",
            Self::InvalidUrl { .. } => "host.invalid_url",
            Self::ConfigRead { .. } => "config.read_failed",
            Self::ConfigParse(_) => "config.parse_failed",
            Self::ConfigValue { .. } => "config.invalid_value",
        }
    }
}
