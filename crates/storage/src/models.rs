//! Storage models.

use std::path::PathBuf;

/// What a directory entry turned out to be when it was listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// A single child of a listed directory.
///
/// Returned by [`StorageBackend::entries`](crate::StorageBackend::entries).
/// Broken symlinks, sockets and other oddities are never reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Relative path from storage root
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Size in bytes (zero for directories)
    pub size: u64,
}
impl Entry {
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self { path: path.into(), kind: EntryKind::File, size }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Final path segment, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
