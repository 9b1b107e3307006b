//! Persisted artifact schema.
//!
//! Artifacts have gone through three shapes over time: a bare array of
//! `{path, hash}` pairs, the same array with names and timestamps, and the
//! current versioned envelope:
//!
//! ```json
//! {
//!   "version": 2,
//!   "root": "/data/photos",
//!   "withHash": true,
//!   "entries": [
//!     {
//!       "name": "holiday.jpg",
//!       "path": "/data/photos/holiday.jpg",
//!       "hash": "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed",
//!       "creationTimeMs": 1700000000000,
//!       "lastChangeTimeMs": 1700000000000,
//!       "lastModifyTimeMs": 1700000000000
//!     }
//!   ]
//! }
//! ```
//!
//! Only the envelope is ever written. Every shape can be read.

use crate::error::{ErrorKind, Result};
use crate::key::ArtifactKey;
use backcheck_storage::FileDescriptor;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version written by [`Artifact::encode`]. Anything newer is rejected.
pub const SCHEMA_VERSION: u32 = 2;

/// A decoded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Root and hashing mode recorded in the artifact. Legacy artifacts
    /// carry neither.
    pub key: Option<ArtifactKey>,
    pub entries: Vec<FileDescriptor>,
}

impl Artifact {
    pub fn encode(key: &ArtifactKey, entries: &[FileDescriptor]) -> Result<Vec<u8>> {
        let record = EnvelopeRecord {
            version: SCHEMA_VERSION,
            root: key.root.clone(),
            with_hash: key.with_hash,
            entries: entries.iter().map(EntryRecord::from).collect(),
        };
        serde_json::to_vec(&record).or_raise(|| ErrorKind::InvalidData("artifact"))
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let record: AnyRecord = serde_json::from_slice(data).or_raise(|| ErrorKind::InvalidData("artifact"))?;
        match record {
            AnyRecord::Envelope(envelope) if envelope.version > SCHEMA_VERSION => {
                exn::bail!(ErrorKind::InvalidData("artifact version"))
            },
            AnyRecord::Envelope(envelope) => Ok(Self {
                key: Some(ArtifactKey::new(envelope.root, envelope.with_hash)),
                entries: envelope.entries.into_iter().map(FileDescriptor::from).collect(),
            }),
            AnyRecord::Legacy(entries) => Ok(Self {
                key: None,
                entries: entries.into_iter().map(FileDescriptor::from).collect(),
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyRecord {
    Envelope(EnvelopeRecord),
    Legacy(Vec<EntryRecord>),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRecord {
    version: u32,
    root: PathBuf,
    with_hash: bool,
    entries: Vec<EntryRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    #[serde(default)]
    name: Option<String>,
    path: PathBuf,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default, alias = "creationMs")]
    creation_time_ms: Millis,
    #[serde(default, alias = "lastChangedMs")]
    last_change_time_ms: Millis,
    #[serde(default, alias = "lastModifiedMs")]
    last_modify_time_ms: Millis,
}

/// Older writers stored fractional milliseconds.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Millis {
    Whole(i64),
    Fractional(f64),
}
impl Default for Millis {
    fn default() -> Self {
        Self::Whole(0)
    }
}
impl From<Millis> for i64 {
    fn from(millis: Millis) -> Self {
        match millis {
            Millis::Whole(ms) => ms,
            // Saturating float-to-int cast; NaN becomes 0.
            Millis::Fractional(ms) => ms as i64,
        }
    }
}

impl From<&FileDescriptor> for EntryRecord {
    fn from(file: &FileDescriptor) -> Self {
        Self {
            name: Some(file.name.clone()),
            path: file.path.clone(),
            hash: file.hash.clone(),
            creation_time_ms: Millis::Whole(file.created_ms),
            last_change_time_ms: Millis::Whole(file.changed_ms),
            last_modify_time_ms: Millis::Whole(file.modified_ms),
        }
    }
}
impl From<EntryRecord> for FileDescriptor {
    fn from(record: EntryRecord) -> Self {
        let mut file = FileDescriptor::new(record.path).with_times(
            record.creation_time_ms.into(),
            record.last_change_time_ms.into(),
            record.last_modify_time_ms.into(),
        );
        if let Some(name) = record.name {
            file = file.with_name(name);
        }
        if let Some(hash) = record.hash {
            file = file.with_hash(hash);
        }
        file
    }
}
