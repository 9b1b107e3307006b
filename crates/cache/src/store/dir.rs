//! One JSON file per artifact in a directory.

use super::ArtifactStore;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// Stores each artifact as `<dir>/<id>.json`.
///
/// Writes land in a sibling temporary file first and are renamed into
/// place, so readers only ever observe a complete artifact. The directory is
/// created on first write; a missing directory lists as empty.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    name: String,
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { name: "directory".to_string(), dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }
}

#[async_trait]
impl ArtifactStore for DirectoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Read(self.dir.display().to_string())),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Read(self.dir.display().to_string()))? {
            let path = entry.path();
            if path.extension().is_some_and(|extension| extension == EXTENSION)
                && let Some(id) = path.file_stem().and_then(|stem| stem.to_str())
            {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    async fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(id)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).or_raise(|| ErrorKind::Read(id.to_string())),
        }
    }

    async fn write(&self, id: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(id);
        let temp = self.dir.join(format!(".{id}.{EXTENSION}.tmp"));
        fs::create_dir_all(&self.dir).await.or_raise(|| ErrorKind::Write(id.to_string()))?;
        fs::write(&temp, data).await.or_raise(|| ErrorKind::Write(id.to_string()))?;
        if let Err(err) = fs::rename(&temp, &path).await {
            _ = fs::remove_file(&temp).await;
            return Err(err).or_raise(|| ErrorKind::Write(id.to_string()));
        }
        tracing::debug!(path = %path.display(), bytes = data.len(), "Wrote artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(temp_dir.path().join("not-yet"));
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.read("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read_and_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(temp_dir.path().join(".cache"));
        store.write("photos-abc-true", b"first").await.unwrap();
        store.write("photos-abc-true", b"second").await.unwrap();
        store.write("music-def-false", b"other").await.unwrap();
        std::fs::write(temp_dir.path().join(".cache/notes.txt"), b"ignored").unwrap();

        assert_eq!(store.read("photos-abc-true").await.unwrap().as_deref(), Some(&b"second"[..]));
        let mut ids = store.list().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["music-def-false", "photos-abc-true"]);
        assert!(temp_dir.path().join(".cache/photos-abc-true.json").is_file());
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_write_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let store = DirectoryStore::new(&blocker);
        let err = store.write("id", b"data").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Write("id".to_string()));
    }
}
