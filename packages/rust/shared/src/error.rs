//! Error types for flearoute.
//!
//! Library crates use [`FleaRouteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all flearoute operations.
#[derive(Debug, thiserror::Error)]
pub enum FleaRouteError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the listing site or an API.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON response could not be interpreted.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The geocoding service could not resolve a mandatory place.
    #[error("geocoding error: {0}")]
    Geocoding(String),

    /// The routing service rejected or failed the directions request.
    #[error("routing error: {0}")]
    Routing(String),

    /// Template loading or rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid user input or an empty intermediate result.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FleaRouteError>;

impl FleaRouteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
