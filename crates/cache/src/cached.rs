//! Cached directory scans.

use crate::error::{ErrorKind, Result};
use crate::key::ArtifactKey;
use crate::models::Artifact;
use crate::store::{ArtifactStore, StoreHandle};
use backcheck_storage::{DirectoryWalker, FileDescriptor, KnownHashes, ScanOptions, is_within, normalize_path};
use exn::ResultExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// Shared scan result.
pub type Snapshot = Arc<[FileDescriptor]>;

/// Scans directories through a persistent artifact store.
///
/// - Without [`is_incremental`](ScanOptions::is_incremental), a previous
///   result for the same root and hashing mode is returned as-is, without
///   touching the filesystem.
/// - With it, the directory is always walked again, but digests already
///   recorded for paths under the root (in this root's artifact or any
///   other artifact in the store) are reused instead of recomputed.
///
/// Every fresh walk overwrites the root's artifact and is memoized for the
/// lifetime of the `CacheStore`, so loading the same root twice in one run
/// reads the store at most once.
pub struct CacheStore {
    store: StoreHandle,
    walker: DirectoryWalker,
    memo: Mutex<HashMap<ArtifactKey, Snapshot>>,
}

impl CacheStore {
    pub fn new(store: StoreHandle, walker: DirectoryWalker) -> Self {
        Self { store, walker, memo: Mutex::default() }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Absolute, lexically normalized key for `root`.
    pub fn key_for(root: &Path, options: &ScanOptions) -> Result<ArtifactKey> {
        let absolute = std::path::absolute(root).or_raise(|| ErrorKind::Scan(root.to_path_buf()))?;
        Ok(ArtifactKey::new(normalize_path(absolute), options.with_hash))
    }

    /// Files under `root`, from cache where allowed, otherwise from a fresh
    /// walk that then replaces the cached artifact.
    ///
    /// Unreadable or undecodable artifacts count as absent. Failing to
    /// persist the fresh result is an error, even though the walk itself
    /// succeeded.
    #[instrument(skip_all, fields(root = %root.display(), %options))]
    pub async fn load(&self, root: &Path, options: &ScanOptions) -> Result<Snapshot> {
        let key = Self::key_for(root, options)?;
        let id = key.id();

        let known = if options.is_incremental {
            tracing::info!(%id, "Incrementally rebuilding cache");
            self.bootstrap_key(&key).await
        } else {
            if let Some(files) = self.memoized(&key) {
                tracing::debug!(%id, files = files.len(), "Cache hit in memory");
                return Ok(files);
            }
            if let Some(artifact) = self.read_artifact(&id).await {
                tracing::info!(%id, files = artifact.entries.len(), "Cache hit");
                return Ok(self.memoize(key, artifact.entries));
            }
            tracing::info!(%id, "No cache found");
            KnownHashes::new()
        };

        let files = self
            .walker
            .scan(&key.root, &known, options)
            .await
            .or_raise(|| ErrorKind::Scan(key.root.clone()))?;
        tracing::info!(%id, files = files.len(), reused = known.len(), "Scan finished");

        let data = Artifact::encode(&key, &files).or_raise(|| ErrorKind::Write(id.clone()))?;
        self.store.write(&id, &data).await?;
        tracing::info!(%id, store = self.store.name(), "Wrote cache");
        Ok(self.memoize(key, files))
    }

    /// The known-hash map an incremental [`load`](Self::load) of `root`
    /// would start from.
    pub async fn bootstrap(&self, root: &Path, options: &ScanOptions) -> Result<KnownHashes> {
        let key = Self::key_for(root, options)?;
        Ok(self.bootstrap_key(&key).await)
    }

    async fn bootstrap_key(&self, key: &ArtifactKey) -> KnownHashes {
        let id = key.id();
        let mut known = KnownHashes::new();
        if key.with_hash {
            let others = match self.store.list().await {
                Ok(ids) => ids,
                Err(err) => {
                    tracing::warn!(error = ?err, "Cannot list artifacts, skipping bootstrap");
                    Vec::new()
                },
            };
            for other in others.iter().filter(|other| **other != id) {
                if let Some(artifact) = self.read_artifact(other).await {
                    let before = known.len();
                    fold_hashes(&mut known, &key.root, artifact.entries.iter());
                    tracing::debug!(artifact = %other, inherited = known.len() - before, "Bootstrapped from artifact");
                }
            }
        }
        // The root's own artifact goes last so that its digests win.
        let baseline = match self.memoized(key) {
            Some(files) => Some(files),
            None => self.read_artifact(&id).await.map(|artifact| Snapshot::from(artifact.entries)),
        };
        if let Some(files) = baseline {
            fold_hashes(&mut known, &key.root, files.iter());
        }
        tracing::debug!(%id, known = known.len(), "Bootstrap complete");
        known
    }

    async fn read_artifact(&self, id: &str) -> Option<Artifact> {
        let decoded = match self.store.read(id).await {
            Ok(Some(data)) => Artifact::decode(&data).or_raise(|| ErrorKind::Read(id.to_string())),
            Ok(None) => return None,
            Err(err) => Err(err),
        };
        match decoded {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                tracing::warn!(%id, error = ?err, "Ignoring unreadable artifact");
                None
            },
        }
    }

    fn memoized(&self, key: &ArtifactKey) -> Option<Snapshot> {
        self.memo.lock().ok()?.get(key).cloned()
    }

    fn memoize(&self, key: ArtifactKey, files: Vec<FileDescriptor>) -> Snapshot {
        let files = Snapshot::from(files);
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(key, files.clone());
        }
        files
    }
}

fn fold_hashes<'a>(known: &mut KnownHashes, root: &Path, files: impl Iterator<Item = &'a FileDescriptor>) {
    for file in files {
        let Some(hash) = &file.hash else { continue };
        let path: PathBuf = normalize_path(&file.path);
        if is_within(&path, root) {
            known.insert(path, hash.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArtifactStore, DirectoryStore, MemoryStore, ReadOnlyStore};
    use backcheck_asyncutils::AdmissionPool;
    use backcheck_storage::HashComputer;

    const HELLO_WORLD_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    fn cache_over(store: Arc<MemoryStore>) -> CacheStore {
        CacheStore::new(store, DirectoryWalker::new(HashComputer::new(AdmissionPool::new(4))))
    }

    fn options(is_incremental: bool) -> ScanOptions {
        ScanOptions { with_hash: true, is_incremental, continue_on_failure: false }
    }

    fn write(root: &Path, relative: &str, contents: &[u8]) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn seed(store: &MemoryStore, root: &Path, files: &[FileDescriptor]) {
        let key = ArtifactKey::new(root, true);
        store.write(&key.id(), &Artifact::encode(&key, files).unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_miss_scans_and_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "hello.txt", b"hello world");
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(store.clone());

        let files = cache.load(temp_dir.path(), &options(false)).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hash.as_deref(), Some(HELLO_WORLD_SHA1));
        assert_eq!(store.writes(), 1);

        let key = CacheStore::key_for(temp_dir.path(), &options(false)).unwrap();
        let stored = Artifact::decode(&store.read(&key.id()).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.entries[0].path, path);
    }

    #[tokio::test]
    async fn test_hit_does_not_walk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("gone");
        let store = Arc::new(MemoryStore::new());
        let cached = FileDescriptor::new(root.join("ghost.txt")).with_hash("abc");
        seed(&store, &root, std::slice::from_ref(&cached)).await;

        // The root does not exist, so any traversal would fail.
        let files = cache_over(store.clone()).load(&root, &options(false)).await.unwrap();
        assert_eq!(&*files, &[cached]);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_memo_avoids_store_reads() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(temp_dir.path(), "hello.txt", b"hello world");
        let store = Arc::new(MemoryStore::new());
        let cache = cache_over(store.clone());

        let first = cache.load(temp_dir.path(), &options(false)).await.unwrap();
        let reads = store.reads();
        let second = cache.load(temp_dir.path(), &options(false)).await.unwrap();
        assert_eq!(store.reads(), reads);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(temp_dir.path(), "hello.txt", b"hello world");
        let key = CacheStore::key_for(temp_dir.path(), &options(false)).unwrap();
        let store = Arc::new(MemoryStore::with_artifacts([(key.id(), b"{\"version\":".to_vec())]));

        let files = cache_over(store.clone()).load(temp_dir.path(), &options(false)).await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(Artifact::decode(&store.read(&key.id()).await.unwrap().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_incremental_reuses_baseline_hashes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = std::path::absolute(temp_dir.path()).unwrap();
        let path = write(&root, "hello.txt", b"hello world");
        write(&root, "fresh.txt", b"hello world");
        let store = Arc::new(MemoryStore::new());
        seed(&store, &root, &[FileDescriptor::new(&path).with_hash("trusted")]).await;

        let files = cache_over(store).load(&root, &options(true)).await.unwrap();
        let hashes: HashMap<_, _> = files.iter().map(|file| (file.name.as_str(), file.hash.as_deref())).collect();
        assert_eq!(hashes["hello.txt"], Some("trusted"));
        assert_eq!(hashes["fresh.txt"], Some(HELLO_WORLD_SHA1));
    }

    #[tokio::test]
    async fn test_bootstrap_inherits_overlapping_artifacts() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, Path::new("/data/a"), &[
            FileDescriptor::new("/data/a/top.txt").with_hash("h-top"),
            FileDescriptor::new("/data/a/b/c/from-a.txt").with_hash("h-from-a"),
        ])
        .await;
        seed(&store, Path::new("/data/a/b"), &[
            FileDescriptor::new("/data/a/b/c/d/from-b.txt").with_hash("h-from-b"),
            FileDescriptor::new("/data/a/b/cd/sibling.txt").with_hash("h-sibling"),
            FileDescriptor::new("/data/a/b/c/unhashed.txt"),
        ])
        .await;
        let cache = cache_over(store);

        let known = cache.bootstrap(Path::new("/data/a/b/c"), &options(true)).await.unwrap();
        assert_eq!(
            known,
            KnownHashes::from([
                (PathBuf::from("/data/a/b/c/from-a.txt"), "h-from-a".to_string()),
                (PathBuf::from("/data/a/b/c/d/from-b.txt"), "h-from-b".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_bootstrap_without_hash_ignores_other_artifacts() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, Path::new("/data"), &[FileDescriptor::new("/data/x/file.txt").with_hash("h")]).await;
        let options = ScanOptions { with_hash: false, ..options(true) };
        let known = cache_over(store).bootstrap(Path::new("/data/x"), &options).await.unwrap();
        assert!(known.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_skips_unreadable_artifacts() {
        let store = Arc::new(MemoryStore::with_artifacts([("broken", b"not json".to_vec())]));
        seed(&store, Path::new("/data"), &[FileDescriptor::new("/data/x/file.txt").with_hash("h")]).await;
        let known = cache_over(store).bootstrap(Path::new("/data/x"), &options(true)).await.unwrap();
        assert_eq!(known.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_failure_is_surfaced() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = std::path::absolute(temp_dir.path().join("missing")).unwrap();
        let err = cache_over(Arc::new(MemoryStore::new())).load(&missing, &options(false)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Scan(missing));
    }

    #[tokio::test]
    async fn test_persist_failure_is_write_error_and_not_memoized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("root");
        write(&root, "hello.txt", b"hello world");
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let cache = CacheStore::new(
            Arc::new(DirectoryStore::new(&blocker)),
            DirectoryWalker::new(HashComputer::new(AdmissionPool::new(4))),
        );
        let key = CacheStore::key_for(&root, &options(false)).unwrap();

        let err = cache.load(&root, &options(false)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Write(key.id()));
        assert!(cache.memoized(&key).is_none());
    }

    #[tokio::test]
    async fn test_read_only_store_still_memoizes() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(temp_dir.path(), "hello.txt", b"hello world");
        let inner = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(
            Arc::new(ReadOnlyStore::new(inner.clone())),
            DirectoryWalker::new(HashComputer::new(AdmissionPool::new(4))),
        );
        let first = cache.load(temp_dir.path(), &options(false)).await.unwrap();
        let second = cache.load(temp_dir.path(), &options(false)).await.unwrap();
        assert_eq!(inner.writes(), 0);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
