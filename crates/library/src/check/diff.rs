use super::key::KeyFields;
use backcheck_storage::FileDescriptor;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A copy entry with no counterpart in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingEntry<'a> {
    pub entry: &'a FileDescriptor,
    /// A source file with the same contents but a different key, e.g.
    /// renamed or touched. Only looked up when the hash is part of the key.
    pub identical_in_source: Option<&'a Path>,
}

/// Every entry of `copy` whose composite key occurs nowhere in `source`, in
/// `copy` order.
///
/// Duplicate keys within `copy` are each reported. When several source
/// entries share a missing entry's hash, the hint names the first of them.
pub fn diff<'a>(copy: &'a [FileDescriptor], source: &'a [FileDescriptor], fields: &KeyFields) -> Vec<MissingEntry<'a>> {
    let source_keys: HashSet<String> = source.iter().map(|file| fields.key_of(file)).collect();
    let mut by_hash: HashMap<&str, &Path> = HashMap::new();
    if fields.hash {
        for file in source {
            if let Some(hash) = file.hash.as_deref() {
                by_hash.entry(hash).or_insert(file.path.as_path());
            }
        }
    }

    copy.iter()
        .filter(|file| !source_keys.contains(&fields.key_of(file)))
        .map(|entry| MissingEntry {
            entry,
            identical_in_source: entry.hash.as_deref().and_then(|hash| by_hash.get(hash).copied()),
        })
        .collect()
}
