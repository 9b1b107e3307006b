//! Per-file scan results.

use std::fs::Metadata;
use std::io::Result as IoResult;
use std::path::PathBuf;
use std::time::SystemTime;
use time::OffsetDateTime;

/// One regular file found by a scan.
///
/// Timestamps are milliseconds since the Unix epoch. Platforms that do not
/// report a birth time get `0` for `created_ms`; platforms without an inode
/// change time report the modification time as `changed_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDescriptor {
    /// Final path component.
    pub name: String,
    /// Full path, as reached from the scanned root.
    pub path: PathBuf,
    /// Lowercase hex SHA-1 of the contents, if hashing was requested.
    pub hash: Option<String>,
    pub created_ms: i64,
    pub changed_ms: i64,
    pub modified_ms: i64,
}

impl FileDescriptor {
    /// Create a descriptor with no hash and zeroed timestamps. The name is
    /// derived from the path's final component.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        Self {
            name,
            path,
            hash: None,
            created_ms: 0,
            changed_ms: 0,
            modified_ms: 0,
        }
    }

    pub(crate) fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let modified_ms = system_time_ms(metadata.modified()).unwrap_or_default();
        Self::new(path).with_times(
            system_time_ms(metadata.created()).unwrap_or_default(),
            change_time_ms(metadata).unwrap_or(modified_ms),
            modified_ms,
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_times(mut self, created_ms: i64, changed_ms: i64, modified_ms: i64) -> Self {
        self.created_ms = created_ms;
        self.changed_ms = changed_ms;
        self.modified_ms = modified_ms;
        self
    }
}

fn system_time_ms(time: IoResult<SystemTime>) -> Option<i64> {
    let time = OffsetDateTime::from(time.ok()?);
    i64::try_from(time.unix_timestamp_nanos() / 1_000_000).ok()
}

#[cfg(unix)]
fn change_time_ms(metadata: &Metadata) -> Option<i64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ctime().saturating_mul(1_000).saturating_add(metadata.ctime_nsec() / 1_000_000))
}

#[cfg(not(unix))]
fn change_time_ms(_metadata: &Metadata) -> Option<i64> {
    None
}
