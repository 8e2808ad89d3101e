//! Error types.
//!
//! Parse problems are never errors (see `ParseWarning`). The enums here
//! cover a single failed build, bad settings/theme JSON, and file loading.

use std::path::PathBuf;

use thiserror::Error;

/// A build call could not run with the configuration it was given.
///
/// Fatal to that call only: no pages are returned and a previously cached
/// layout stays valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("page height must be positive and finite, got {0}")]
    InvalidPageHeight(f64),

    #[error("content width must be positive and finite, got {0}")]
    InvalidContentWidth(f64),

    #[error("text measurement unavailable: {0}")]
    Measurement(#[from] MeasureError),
}

/// The host's text measurer failed or returned an unusable size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MeasureError {
    pub message: String,
}

impl MeasureError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Settings or theme JSON could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {what} JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// A song file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("song text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
