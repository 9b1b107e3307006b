use backcheck_storage::FileDescriptor;
use std::fmt::Write;

const SEPARATOR: char = '\0';

/// Which descriptor fields take part in the composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyFields {
    pub hash: bool,
    pub name: bool,
    pub created: bool,
    pub changed: bool,
    pub modified: bool,
}

impl Default for KeyFields {
    fn default() -> Self {
        Self {
            hash: true,
            name: true,
            created: true,
            changed: true,
            modified: true,
        }
    }
}

impl KeyFields {
    /// Drop every timestamp from the key.
    pub fn without_dates(self) -> Self {
        Self {
            created: false,
            changed: false,
            modified: false,
            ..self
        }
    }

    /// Composite key of `file`.
    ///
    /// Each enabled field is written as `label:value` and fields are joined
    /// by a NUL byte, which cannot occur in a file name, so distinct field
    /// values can never produce the same key. A disabled field is left out
    /// entirely. An absent hash is written as an empty value.
    pub fn key_of(&self, file: &FileDescriptor) -> String {
        let mut key = String::new();
        let mut push = |label: &str, value: &dyn std::fmt::Display| {
            if !key.is_empty() {
                key.push(SEPARATOR);
            }
            // Writing into a String cannot fail.
            _ = write!(key, "{label}:{value}");
        };
        if self.hash {
            push("hash", &file.hash.as_deref().unwrap_or_default());
        }
        if self.name {
            push("name", &file.name);
        }
        if self.created {
            push("created", &file.created_ms);
        }
        if self.changed {
            push("changed", &file.changed_ms);
        }
        if self.modified {
            push("modified", &file.modified_ms);
        }
        key
    }
}
