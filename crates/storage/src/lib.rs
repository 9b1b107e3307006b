//! Filesystem scanning for backcheck.
//!
//! [`DirectoryWalker::scan`] turns a directory tree into a flat list of
//! [`FileDescriptor`]s, digesting contents through a [`HashComputer`] that is
//! bounded by an [`AdmissionPool`](backcheck_asyncutils::AdmissionPool).

pub mod error;
mod file;
mod hash;
mod options;
mod path;
mod walk;

pub use crate::file::FileDescriptor;
pub use crate::hash::{DEFAULT_BUFFER_SIZE, Digester, HashComputer, Sha1Digester, weight_for};
pub use crate::options::ScanOptions;
pub use crate::path::{is_within, normalize as normalize_path};
pub use crate::walk::{DirectoryWalker, KnownHashes};
