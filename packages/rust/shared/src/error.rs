//! Error types for CheckIO.
//!
//! Library crates use [`CheckIoError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CheckIO operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckIoError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to the asset directory (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The asset directory answered, but with a failure.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// A looked-up entity does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input rejected before reaching the upstream (bad ids, mode violations).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The current session lacks the required access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CheckIoError>;

impl CheckIoError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an upstream error from a status code and message body.
    pub fn upstream(status: u16, msg: impl Into<String>) -> Self {
        Self::Upstream {
            status,
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
