//! Read-only artifact store.

use super::{ArtifactStore, StoreHandle};
use crate::error::Result;
use async_trait::async_trait;

/// Wraps another store and silently drops all writes, logging an
/// [`info event`](tracing::Event) instead. Used for dry runs.
#[derive(Clone)]
pub struct ReadOnlyStore {
    inner: StoreHandle,
}
impl ReadOnlyStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ArtifactStore for ReadOnlyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.inner.list().await
    }

    async fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.inner.read(id).await
    }

    async fn write(&self, id: &str, data: &[u8]) -> Result<()> {
        tracing::info!(id, bytes = data.len(), "Skipping artifact write during read-only mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_writes_are_dropped() {
        let inner = Arc::new(MemoryStore::with_artifacts([("kept", b"original".to_vec())]));
        let store = ReadOnlyStore::new(inner.clone());
        store.write("kept", b"replaced").await.unwrap();
        store.write("new", b"data").await.unwrap();
        assert_eq!(store.read("kept").await.unwrap().as_deref(), Some(&b"original"[..]));
        assert_eq!(store.list().await.unwrap(), vec!["kept"]);
        assert_eq!(inner.writes(), 0);
    }
}
