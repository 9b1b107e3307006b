//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. The underlying I/O error is kept as
//! a child frame rather than flattened into the kind.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A directory could not be listed, or one of its entries could not be
    /// inspected.
    #[display("cannot enumerate: {}", _0.display())]
    Enumeration(#[error(not(source))] PathBuf),
    /// Reading a file's contents failed part-way through digesting it.
    #[display("cannot digest file: {}", _0.display())]
    Hash(#[error(not(source))] PathBuf),
    /// Every hashing attempt for the file failed.
    #[display("gave up digesting file: {}", _0.display())]
    RetryExhausted(#[error(not(source))] PathBuf),
    /// A failure under a fail-fast scan aborted the whole scan.
    #[display("scan aborted: {}", _0.display())]
    ScanAborted(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Enumeration(_) | Self::Hash(_))
    }
}
