//! Artifact store trait and implementations.
//!
//! A store is a flat key-value namespace: artifact ids map to opaque
//! payloads. Stores know nothing about the artifact schema; decoding is
//! [`Artifact`](crate::Artifact)'s job.

mod dir;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod readonly;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use self::dir::DirectoryStore;
#[cfg(any(test, feature = "mock"))]
pub use self::memory::MemoryStore;
pub use self::readonly::ReadOnlyStore;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to any artifact store.
pub type StoreHandle = Arc<dyn ArtifactStore>;

/// Persistent key-value storage for scan artifacts.
///
/// # Examples
///
/// ```
/// use backcheck_cache::store::ArtifactStore;
/// use backcheck_cache::error::Result;
///
/// async fn total_size(store: &dyn ArtifactStore) -> Result<usize> {
///     let mut total = 0;
///     for id in store.list().await? {
///         total += store.read(&id).await?.map_or(0, |data| data.len());
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Name of the store, for logging only.
    fn name(&self) -> &str;

    /// Ids of every artifact currently stored, in no particular order.
    async fn list(&self) -> Result<Vec<String>>;

    /// Payload of an artifact, or `None` if nothing is stored under `id`.
    async fn read(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Store `data` under `id`, fully replacing any previous payload.
    async fn write(&self, id: &str, data: &[u8]) -> Result<()>;
}
