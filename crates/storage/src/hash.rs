//! Content digests.
//!
//! [`HashComputer`] routes every digest attempt through an
//! [`AdmissionPool`], weighted by file size and divided by the attempt
//! number: large files go first, and a file that keeps failing sinks in the
//! queue instead of monopolizing it.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use backcheck_asyncutils::{AdmissionPool, DEFAULT_MAX_ATTEMPTS, JobAnalytics, with_retries};
use exn::ResultExt;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Chunk size used when streaming a file through the digest.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Produces a content fingerprint for a file.
#[async_trait]
pub trait Digester: Send + Sync {
    async fn digest(&self, path: &Path) -> Result<String>;
}

/// Streams a file through SHA-1, never holding more than one buffer of it in
/// memory, and returns the digest as lowercase hex.
#[derive(Debug, Clone)]
pub struct Sha1Digester {
    buffer_size: usize,
}
impl Default for Sha1Digester {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}
impl Sha1Digester {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size: buffer_size.max(1) }
    }
}

#[async_trait]
impl Digester for Sha1Digester {
    async fn digest(&self, path: &Path) -> Result<String> {
        let mut file = File::open(path).await.or_raise(|| ErrorKind::Hash(path.to_path_buf()))?;
        let mut hasher = Sha1::new();
        let mut buffer = vec![0; self.buffer_size];
        loop {
            let read = file.read(&mut buffer).await.or_raise(|| ErrorKind::Hash(path.to_path_buf()))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Queue weight of a digest attempt: `size / attempt`.
pub fn weight_for(size: u64, attempt: u32) -> f64 {
    size as f64 / f64::from(attempt.max(1))
}

/// Admission-controlled, retrying digest computation.
#[derive(Clone)]
pub struct HashComputer {
    pool: AdmissionPool,
    digester: Arc<dyn Digester>,
    max_attempts: u32,
}

impl HashComputer {
    /// A SHA-1 computer making up to [`DEFAULT_MAX_ATTEMPTS`] attempts per file.
    pub fn new(pool: AdmissionPool) -> Self {
        Self {
            pool,
            digester: Arc::new(Sha1Digester::default()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_digester(mut self, digester: Arc<dyn Digester>) -> Self {
        self.digester = digester;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn pool(&self) -> &AdmissionPool {
        &self.pool
    }

    /// Digest a file once, bypassing the pool and the retry policy.
    pub async fn compute_digest(&self, path: &Path) -> Result<String> {
        self.digester.digest(path).await
    }

    /// Digest a file of `size` bytes through the pool, retrying failures.
    ///
    /// Returns the digest and the analytics of the successful attempt.
    pub async fn digest(&self, path: &Path, size: u64) -> Result<(String, JobAnalytics)> {
        with_retries(self.max_attempts, |attempt| async move {
            let weight = weight_for(size, attempt);
            let (result, analytics) = self.pool.submit_timed(weight, self.digester.digest(path)).await;
            result.map(|hash| (hash, analytics))
        })
        .await
        .or_raise(|| ErrorKind::RetryExhausted(path.to_path_buf()))
    }
}

/// Fails for one specific file name and delegates to SHA-1 otherwise.
#[cfg(test)]
pub(crate) struct FlakyDigester {
    pub(crate) failing_name: &'static str,
    pub(crate) failures: std::sync::atomic::AtomicU32,
    pub(crate) calls: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl FlakyDigester {
    pub(crate) fn failing_on(failing_name: &'static str) -> Self {
        Self {
            failing_name,
            failures: Default::default(),
            calls: Default::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Digester for FlakyDigester {
    async fn digest(&self, path: &Path) -> Result<String> {
        use std::sync::atomic::Ordering;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if path.file_name().is_some_and(|name| name == self.failing_name) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            exn::bail!(ErrorKind::Hash(path.to_path_buf()));
        }
        Sha1Digester::default().digest(path).await
    }
}
