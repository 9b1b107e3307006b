use backcheck_asyncutils::FailurePolicy;
use derive_more::Display;

/// Per-invocation scan settings.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("with_hash={with_hash}, incremental={is_incremental}, continue_on_failure={continue_on_failure}")]
pub struct ScanOptions {
    /// Digest file contents. When `false`, descriptors carry no hash.
    pub with_hash: bool,
    /// Rescan even if a cached result exists, reusing known hashes.
    pub is_incremental: bool,
    /// Drop failing entries (with a warning) instead of aborting the scan.
    pub continue_on_failure: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            with_hash: true,
            is_incremental: false,
            continue_on_failure: false,
        }
    }
}

impl ScanOptions {
    pub fn failure_policy(&self) -> FailurePolicy {
        match self.continue_on_failure {
            true => FailurePolicy::Continue,
            false => FailurePolicy::FailFast,
        }
    }
}
