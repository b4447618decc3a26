//! Error types for linkaudit.
//!
//! Library crates use [`LinkAuditError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.
//!
//! Expected network conditions (timeouts, 4xx/5xx, auth walls) are NOT
//! errors — the prober records them as outcomes. These variants cover
//! genuine faults: bad configuration, report I/O, provider setup.

use std::path::PathBuf;

/// Top-level error type for all linkaudit operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkAuditError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error outside the prober's fail-open boundary.
    #[error("network error: {0}")]
    Network(String),

    /// Text or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Search provider setup error (missing credentials, bad endpoint).
    #[error("search provider error: {0}")]
    Search(String),

    /// Report serialization or write error.
    #[error("report error: {0}")]
    Report(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed registry, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LinkAuditError>;

impl LinkAuditError {
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
