use thiserror::Error;

/// The error type for resolution.
///
/// Deliberately small: a failing record store is the only condition that
/// aborts a resolution pass. Missing references resolve to empty results,
/// malformed records are logged and skipped, and invalid text prunes the
/// owning node.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error("record store error: {0}")]
    Store(#[from] loredata::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
