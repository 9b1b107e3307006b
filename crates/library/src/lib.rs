//! The two things backcheck does with cached scans.
//!
//! - [`build`](build::build): warm the cache for one or more trees, optionally
//!   visiting subdirectories first so that a later incremental scan of the
//!   parent inherits their digests.
//! - [`check`](check::check): report every file of a copy tree whose
//!   composite key does not occur in a source tree.

pub mod build;
pub mod check;
pub mod error;
