use derive_more::Display;
use std::path::{Path, PathBuf};

/// Identity of a persisted scan: which root, and whether contents were hashed.
///
/// The root is expected to be absolute and normalized already; two spellings
/// of the same directory otherwise end up as two artifacts.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{}", self.id())]
pub struct ArtifactKey {
    pub root: PathBuf,
    pub with_hash: bool,
}

impl ArtifactKey {
    pub fn new(root: impl Into<PathBuf>, with_hash: bool) -> Self {
        Self { root: root.into(), with_hash }
    }

    /// Store identifier: `<basename>-<blake3 of root>-<with_hash>`.
    ///
    /// The basename keeps the id readable; the digest of the full root keeps
    /// it unique across directories that share a name.
    pub fn id(&self) -> String {
        let digest = blake3::hash(self.root.as_os_str().as_encoded_bytes());
        format!("{}-{}-{}", basename(&self.root), digest.to_hex(), self.with_hash)
    }
}

fn basename(root: &Path) -> String {
    match root.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => "root".to_string(),
    }
}
