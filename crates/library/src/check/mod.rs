//! Copy-versus-source comparison.

mod diff;
mod key;

pub use self::diff::{MissingEntry, diff};
pub use self::key::KeyFields;
use crate::error::{ErrorKind, Result};
use backcheck_cache::CacheStore;
use backcheck_storage::ScanOptions;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// A copy file that has no counterpart in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFile {
    pub path: PathBuf,
    pub identical_in_source: Option<PathBuf>,
}

/// Outcome of [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub copy_root: PathBuf,
    pub source_root: PathBuf,
    pub copy_files: usize,
    pub source_files: usize,
    pub missing: Vec<MissingFile>,
}

impl Report {
    /// Whether everything in copy is accounted for in source.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Load `source_root` and then `copy_root` through `cache` and report every
/// copy file that has no counterpart in source under `fields`.
///
/// Hashing during the scans follows `fields.hash`, whatever
/// `options.with_hash` says: there is no point digesting files whose digest
/// is not compared.
#[instrument(skip_all, fields(copy = %copy_root.display(), source = %source_root.display()))]
pub async fn check(
    cache: &CacheStore,
    copy_root: &Path,
    source_root: &Path,
    options: &ScanOptions,
    fields: &KeyFields,
) -> Result<Report> {
    let options = ScanOptions { with_hash: fields.hash, ..*options };
    let source = cache.load(source_root, &options).await.or_raise(|| ErrorKind::Cache)?;
    let copy = cache.load(copy_root, &options).await.or_raise(|| ErrorKind::Cache)?;
    tracing::info!(
        source_files = source.len(),
        copy_files = copy.len(),
        hash = fields.hash,
        name = fields.name,
        created = fields.created,
        changed = fields.changed,
        modified = fields.modified,
        "Checking that every entry of copy exists in source"
    );

    let missing: Vec<MissingFile> = diff(&copy, &source, fields)
        .into_iter()
        .map(|missing| {
            match missing.identical_in_source {
                Some(identical) => tracing::warn!(
                    path = %missing.entry.path.display(),
                    identical = %identical.display(),
                    "No such file in source, but identical file found in source"
                ),
                None => tracing::warn!(path = %missing.entry.path.display(), "No such file in source"),
            }
            MissingFile {
                path: missing.entry.path.clone(),
                identical_in_source: missing.identical_in_source.map(Path::to_path_buf),
            }
        })
        .collect();

    match missing.len() {
        0 => tracing::info!("Every file in copy is available in source"),
        count => tracing::warn!(missing = count, "Files in copy cannot be matched to anything in source"),
    }
    Ok(Report {
        copy_root: copy_root.to_path_buf(),
        source_root: source_root.to_path_buf(),
        copy_files: copy.len(),
        source_files: source.len(),
        missing,
    })
}
