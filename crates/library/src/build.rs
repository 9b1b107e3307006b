//! Cache warming.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use backcheck_cache::CacheStore;
use backcheck_storage::ScanOptions;
use exn::ResultExt;
use futures::Stream;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Started,
    /// Number of directories that are about to be loaded.
    Planned(usize),
    Scanned { root: PathBuf, files: usize },
    Complete,
}

/// Load every root in `roots` through `cache`, one directory at a time.
///
/// With `dig > 0`, the subdirectories of each root down to that depth are
/// loaded first, deepest first, and the root last. Each scan persists an
/// artifact, so an incremental load of a parent can inherit the digests
/// of the children loaded just before it.
///
/// The stream ends after the first error.
pub fn build<'a>(
    cache: &'a CacheStore,
    roots: &'a [PathBuf],
    options: ScanOptions,
    dig: usize,
) -> impl Stream<Item = Result<BuildEvent>> + 'a {
    stream! {
        yield Ok(BuildEvent::Started);
        let mut planned = Vec::new();
        for root in roots {
            match plan(root, dig).await {
                Ok(directories) => planned.extend(directories),
                Err(err) => {
                    yield Err(err);
                    return;
                },
            }
        }
        yield Ok(BuildEvent::Planned(planned.len()));
        for root in planned {
            match cache.load(&root, &options).await {
                Ok(files) => yield Ok(BuildEvent::Scanned { files: files.len(), root }),
                Err(err) => {
                    yield Err(err).or_raise(|| ErrorKind::Cache);
                    return;
                },
            }
        }
        yield Ok(BuildEvent::Complete);
    }
}

/// Directories under `root` down to `depth` levels, children before their
/// parent and `root` itself last. Symbolic links are not followed.
pub async fn plan(root: &Path, depth: usize) -> Result<Vec<PathBuf>> {
    let mut planned = Vec::new();
    plan_into(root.to_path_buf(), depth, &mut planned).await?;
    Ok(planned)
}

fn plan_into(dir: PathBuf, depth: usize, planned: &mut Vec<PathBuf>) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        if depth > 0 {
            let mut children = Vec::new();
            let mut entries = fs::read_dir(&dir).await.or_raise(|| ErrorKind::Enumeration(dir.clone()))?;
            while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Enumeration(dir.clone()))? {
                let file_type = entry.file_type().await.or_raise(|| ErrorKind::Enumeration(entry.path()))?;
                if file_type.is_dir() {
                    children.push(entry.path());
                }
            }
            // Directory listings come back in arbitrary order.
            children.sort();
            for child in children {
                plan_into(child, depth - 1, planned).await?;
            }
        }
        planned.push(dir);
        Ok(())
    })
}
