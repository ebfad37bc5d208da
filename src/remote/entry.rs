use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::DELIMITER;

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A bucket
    Container {
        name: String,
        created_at: Option<DateTime<Utc>>,
    },
    /// Synthetic ".." row leading one level up
    UpDir,
    /// Common prefix acting as a directory; `prefix` keeps the trailing delimiter
    Group { prefix: String },
    /// An object
    Leaf {
        key: String,
        modified_at: Option<DateTime<Utc>>,
        size: u64,
    },
}

impl Entry {
    /// Full identifier: bucket name, key prefix or object key.
    pub fn name(&self) -> &str {
        match self {
            Entry::Container { name, .. } => name,
            Entry::UpDir => "..",
            Entry::Group { prefix } => prefix,
            Entry::Leaf { key, .. } => key,
        }
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Entry::Container { created_at, .. } => *created_at,
            Entry::Leaf { modified_at, .. } => *modified_at,
            Entry::UpDir | Entry::Group { .. } => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            Entry::Leaf { size, .. } => Some(*size),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Entry::Leaf { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Entry::Container { .. } => "bucket",
            Entry::UpDir => "parent",
            Entry::Group { .. } => "prefix",
            Entry::Leaf { .. } => "object",
        }
    }

    /// Name relative to the listing's `prefix`, for display only.
    pub fn display_name<'a>(&'a self, prefix: &str) -> &'a str {
        let name = self.name();
        match self {
            Entry::Group { .. } | Entry::Leaf { .. } => {
                name.strip_prefix(prefix).filter(|s| !s.is_empty()).unwrap_or(name)
            }
            _ => name,
        }
    }

    /// Last path segment of a key, used as the local file name.
    pub fn file_name(&self) -> &str {
        let name = self.name().trim_end_matches(DELIMITER);
        name.rsplit(DELIMITER).next().unwrap_or(name)
    }
}

/// Object metadata as returned by a HEAD request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub storage_class: Option<String>,
    pub user_metadata: BTreeMap<String, String>,
}
