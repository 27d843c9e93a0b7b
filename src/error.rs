//! Error types for pathsift operations.

use thiserror::Error;

/// Errors that can occur while acquiring documents or running detection.
///
/// Structural oddities inside a single document (no divergent paths, a
/// table without a header row, configured exclusions) are never errors;
/// they only shrink the result.
#[derive(Error, Debug)]
pub enum Error {
    #[error("at least two documents are required for comparison, got {got}")]
    TooFewDocuments { got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "fetch")]
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid path `{input}`: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("invalid selector `{input}`: {reason}")]
    InvalidSelector { input: String, reason: String },

    #[cfg(feature = "serde")]
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
