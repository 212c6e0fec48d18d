//! Error types for ordertrack.
//!
//! Library crates use [`OrderTrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ordertrack operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderTrackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure while fetching a listing or detail page.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Selector or timestamp parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input (bad URL, bad schedule time, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrderTrackError>;

impl OrderTrackError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = OrderTrackError::config("unknown on_known value");
        assert_eq!(err.to_string(), "config error: unknown on_known value");

        let err = OrderTrackError::Fetch("https://example.com: HTTP 503".into());
        assert!(err.to_string().starts_with("fetch error:"));
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = OrderTrackError::io(
            "/tmp/orders.db",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/orders.db"));
    }
}
