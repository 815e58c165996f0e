//! Revision fingerprint supplied by the version-control collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of uncommitted change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// New file.
    Added,
    /// Changed file.
    Modified,
    /// Removed file.
    Deleted,
    /// Moved file.
    Renamed,
    /// File not tracked yet.
    Untracked,
    /// Any status the collaborator reports that is not listed above.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::Renamed => write!(f, "renamed"),
            Self::Untracked => write!(f, "untracked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One uncommitted change relative to the base commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// What happened to the file.
    pub change_type: ChangeType,
    /// Path of the file.
    pub name: String,
    /// Content checksum as computed by the collaborator.
    #[serde(default)]
    pub checksum: String,
}

impl Change {
    /// Create a change record.
    pub fn new(change_type: ChangeType, name: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            change_type,
            name: name.into(),
            checksum: checksum.into(),
        }
    }
}

/// Base commit plus the working-tree changes on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionData {
    /// Base commit hash.
    #[serde(rename = "SHA1")]
    pub sha1: String,
    /// Ordered list of uncommitted changes.
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl RevisionData {
    /// A clean checkout at `sha1`.
    pub fn clean(sha1: impl Into<String>) -> Self {
        Self {
            sha1: sha1.into(),
            changes: Vec::new(),
        }
    }

    /// Builder: append a change.
    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    /// True when there are no uncommitted changes.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}
