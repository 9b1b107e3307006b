//! In-memory artifact store for testing.

use super::ArtifactStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory artifact store for testing.
///
/// Artifacts are kept in a `HashMap` behind a [`RwLock`]. Reads and writes
/// are counted so tests can assert that a cache hit did not touch the store.
#[derive(Default)]
pub struct MemoryStore {
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with artifacts.
    pub fn with_artifacts(artifacts: impl IntoIterator<Item = (impl Into<String>, Vec<u8>)>) -> Self {
        let artifacts = artifacts.into_iter().map(|(id, data)| (id.into(), data)).collect();
        Self { artifacts: RwLock::new(artifacts), ..Self::default() }
    }

    /// Number of [`read`](ArtifactStore::read) calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of [`write`](ArtifactStore::write) calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.artifacts.read().await.keys().cloned().collect())
    }

    async fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifacts.read().await.get(id).cloned())
    }

    async fn write(&self, id: &str, data: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.artifacts.write().await.insert(id.to_string(), data.to_vec());
        Ok(())
    }
}
