//! Persistent scan artifacts for backcheck.
//!
//! A scan of a directory tree is expensive: every file is read end to end to
//! digest it. This crate keeps the result of each scan as an *artifact* so it
//! can be reused.
//!
//! # Architecture
//! - [`ArtifactStore`](store::ArtifactStore): where artifacts live. A
//!   directory of JSON files by default, or a single SQLite database with the
//!   `sqlite` feature.
//! - [`Artifact`]: the versioned on-disk record. Older, unversioned artifacts
//!   are still readable.
//! - [`CacheStore`]: decides between returning an artifact, rescanning
//!   incrementally with digests inherited from overlapping artifacts, or
//!   scanning from scratch.
//!
//! The artifacts are never the source of truth: deleting them only costs a
//! rescan.

mod cached;
pub mod error;
mod key;
mod models;
pub mod store;

pub use crate::cached::{CacheStore, Snapshot};
pub use crate::key::ArtifactKey;
pub use crate::models::{Artifact, SCHEMA_VERSION};
