//! Error types shared across headmouse crates.

use std::path::PathBuf;

/// Top-level error type for headmouse operations.
#[derive(Debug, thiserror::Error)]
pub enum HeadmouseError {
    #[error("Orientation source error: {message}")]
    Source { message: String },

    #[error("Pointer sink error: {message}")]
    Sink { message: String },

    #[error("Control signal error: {message}")]
    Controls { message: String },

    #[error("Trace error: {message}")]
    Trace { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HeadmouseError.
pub type HeadmouseResult<T> = Result<T, HeadmouseError>;

impl HeadmouseError {
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink {
            message: msg.into(),
        }
    }

    pub fn controls(msg: impl Into<String>) -> Self {
        Self::Controls {
            message: msg.into(),
        }
    }

    pub fn trace(msg: impl Into<String>) -> Self {
        Self::Trace {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
