//! Storage models.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// What kind of thing lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// A single directory entry returned by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Relative path from the storage root
    pub path: PathBuf,
    pub kind: EntryKind,
}
impl Entry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self { path: path.into(), kind }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, EntryKind::File)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, EntryKind::Directory)
    }

    /// Final component of the path, as listed by its parent directory.
    pub fn name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_else(|| self.path.as_os_str())
    }

    /// Name of the directory this entry was listed from, if it isn't the root.
    pub fn parent_name(&self) -> Option<&OsStr> {
        self.path.parent().and_then(Path::file_name)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}
