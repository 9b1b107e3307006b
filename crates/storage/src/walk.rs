//! Recursive directory scanning.
//!
//! Directory traversal fans out without limit: every entry of every
//! directory is inspected concurrently on the current task. Only digesting
//! is bounded, by the [`HashComputer`]'s [`AdmissionPool`](backcheck_asyncutils::AdmissionPool).

use crate::error::{ErrorKind, Result};
use crate::file::FileDescriptor;
use crate::hash::HashComputer;
use crate::options::ScanOptions;
use backcheck_asyncutils::join_with_policy;
use exn::ResultExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Digests already known for a path. A hit is trusted without looking at
/// the file again.
pub type KnownHashes = HashMap<PathBuf, String>;

/// Walks a directory tree and describes every regular file in it.
#[derive(Clone)]
pub struct DirectoryWalker {
    hasher: HashComputer,
}

impl DirectoryWalker {
    pub fn new(hasher: HashComputer) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &HashComputer {
        &self.hasher
    }

    /// Scan everything under `root`.
    ///
    /// - Directories are descended into; regular files become
    ///   [`FileDescriptor`]s; anything else (symlinks, sockets, FIFOs,
    ///   devices) is skipped.
    /// - With [`with_hash`](ScanOptions::with_hash), each file is digested
    ///   unless `known` already has its path.
    /// - With [`continue_on_failure`](ScanOptions::continue_on_failure), a
    ///   failing entry is logged and left out. Otherwise the first failure
    ///   anywhere aborts the scan and nothing is returned.
    ///
    /// Failing to list `root` itself always aborts. The order of the returned
    /// descriptors is unspecified.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn scan(&self, root: &Path, known: &KnownHashes, options: &ScanOptions) -> Result<Vec<FileDescriptor>> {
        match self.scan_dir(root.to_path_buf(), known, options).await {
            Ok(files) => {
                tracing::info!(files = files.len(), %options, "Scan complete");
                Ok(files)
            },
            Err(err) => {
                tracing::debug!(%options, "Scan aborted");
                Err(err.raise(ErrorKind::ScanAborted(root.to_path_buf())))
            },
        }
    }

    // Boxed to make the directory recursion a concrete type.
    fn scan_dir<'a>(
        &'a self,
        dir: PathBuf,
        known: &'a KnownHashes,
        options: &'a ScanOptions,
    ) -> BoxFuture<'a, Result<Vec<FileDescriptor>>> {
        Box::pin(async move {
            let names = Self::list_names(&dir).await?;
            let entries = names.into_iter().map(|name| self.scan_entry(dir.join(name), known, options));
            let settled = join_with_policy(entries, options.failure_policy()).await?;
            for err in &settled.failed {
                tracing::warn!(error = ?err, "Skipping entry that could not be scanned");
            }
            Ok(settled.succeeded.into_iter().flatten().collect())
        })
    }

    async fn list_names(dir: &Path) -> Result<Vec<OsString>> {
        let mut entries = fs::read_dir(dir).await.or_raise(|| ErrorKind::Enumeration(dir.to_path_buf()))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Enumeration(dir.to_path_buf()))? {
            names.push(entry.file_name());
        }
        Ok(names)
    }

    async fn scan_entry(&self, path: PathBuf, known: &KnownHashes, options: &ScanOptions) -> Result<Vec<FileDescriptor>> {
        // Not following symlinks: a link is neither a directory nor a file.
        let metadata = fs::symlink_metadata(&path).await.or_raise(|| ErrorKind::Enumeration(path.clone()))?;
        if metadata.is_dir() {
            return self.scan_dir(path, known, options).await;
        }
        if !metadata.is_file() {
            tracing::info!(path = %path.display(), "Skipped entry that is neither a directory nor a regular file");
            return Ok(Vec::new());
        }

        let file = FileDescriptor::from_metadata(path, &metadata);
        if !options.with_hash {
            return Ok(vec![file]);
        }
        if let Some(hash) = known.get(&file.path) {
            let hash = hash.clone();
            return Ok(vec![file.with_hash(hash)]);
        }
        let (hash, analytics) = self.hasher.digest(&file.path, metadata.len()).await?;
        let pool = self.hasher.pool().stats();
        tracing::debug!(
            name = %file.name,
            %hash,
            execution_ms = analytics.execution_time.as_millis() as u64,
            queued_ms = analytics.time_in_queue.as_millis() as u64,
            waiting_ratio = analytics.waiting_ratio,
            running = pool.running,
            pending = pool.pending,
            "Scanned file"
        );
        Ok(vec![file.with_hash(hash)])
    }
}
