//! Error types for cardtrack.
//!
//! Library crates use [`CardtrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all cardtrack operations.
#[derive(Debug, thiserror::Error)]
pub enum CardtrackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page.
    #[error("network error: {0}")]
    Network(String),

    /// An expected page element is absent or malformed.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// The page-count indicator of a catalog listing could not be read.
    #[error("pagination error: {0}")]
    Pagination(String),

    /// A requested dataset index has no row in the working subset.
    #[error("lookup miss: index {index} is not present in the working subset")]
    LookupMiss { index: usize },

    /// CSV encoding/decoding error in the dataset layer.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid argument, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CardtrackError>;

impl CardtrackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
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
