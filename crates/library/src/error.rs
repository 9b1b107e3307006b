//! Library Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Loading a tree through the cache failed.
    #[display("cannot load directory tree")]
    Cache,
    /// A directory could not be listed while planning a build.
    #[display("cannot enumerate: {}", _0.display())]
    Enumeration(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Enumeration(_))
    }
}
