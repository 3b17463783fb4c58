//! Error types for `LoreData`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for record store operations.
///
/// A failing store is the only condition that aborts resolution upstream;
/// individually malformed records are logged and skipped instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record file could not be parsed as JSON.
    #[error("JSON parse error in {path}: {source}")]
    Json {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The data root directory does not exist.
    #[error("data root not found: {0}")]
    RootNotFound(PathBuf),

    /// The localization table file could not be parsed.
    #[error("text map unreadable: {0}")]
    TextMapUnreadable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
