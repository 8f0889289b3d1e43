//! Shared data types for the dirview core.
//!
//! Everything here is plain data: records produced by the indexer, entries
//! returned by the listing service, and the small path/name helpers every
//! other crate relies on to keep root-relative paths canonical.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod paths;

pub use paths::{
    check_segment, is_under, join_relative, normalize_relative, relative_to, to_absolute,
    to_relative, PathError,
};

/// One regular file discovered during a tree walk.
///
/// `path` is root-relative, forward-slash separated and never starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub size: u64,
    pub modified_ms: u64,
}

impl FileRecord {
    /// Final path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Display name. For collapsed directories this spans several segments
    /// (`a/b/c`); for search hits it is the path relative to the listed dir.
    pub name: String,
    /// Root-relative path the entry refers to.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    #[serde(rename = "mtime")]
    pub modified_ms: u64,
}

impl ListEntry {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name should not contain any of \\/:*<>| (got {0:?})")]
    ForbiddenChar(String),
}

const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '<', '>', '|'];

/// Validate a single file or directory name supplied by an uploader.
pub fn check_filename(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(NameError::ForbiddenChar(name.to_string()));
    }
    Ok(())
}

/// Human readable byte count (`512 B`, `1.5 KB`, `3.2 MB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    match bytes {
        b if b > MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b > KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}
