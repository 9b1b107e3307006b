//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Read-side failures are usually downgraded by
//! [`CacheStore`](crate::CacheStore) to "no cache", so only a handful of
//! these ever reach a caller.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An artifact exists but could not be read back.
    #[display("cannot read artifact: {_0}")]
    Read(#[error(not(source))] String),
    /// An artifact could not be persisted.
    #[display("cannot write artifact: {_0}")]
    Write(#[error(not(source))] String),
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// The directory walk behind a cache miss failed.
    #[display("cannot scan: {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_) | Self::Database)
    }
}
