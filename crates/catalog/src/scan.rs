//! Stateless directory scanning on top of a [`StorageBackend`](shelf_storage::StorageBackend).
//!
//! Everything here skips hidden entries and converts storage errors into
//! catalog errors; nothing here is cached.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shelf_storage::{BackendHandle, Entry, EntryKind, is_hidden};
use std::ffi::OsStr;
use std::path::Path;

/// A page file found while walking a whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChapterFile {
    /// Name of the directory holding the file, spaces replaced by underscores.
    pub chapter: String,
    pub file: String,
}

fn utf8_name(name: &OsStr) -> Result<String> {
    match name.to_str() {
        Some(name) => Ok(name.to_string()),
        None => exn::bail!(ErrorKind::MalformedName(name.to_string_lossy().into_owned())),
    }
}

fn path_label(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Names of the visible children of `path` (the root for `None`) that are of
/// the given kind, in backend order.
pub(crate) async fn list_names(backend: &BackendHandle, path: Option<&Path>, kind: EntryKind) -> Result<Vec<String>> {
    let entries = match backend.list_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Err(e).or_raise(|| ErrorKind::NotFound(path_label(path))),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
    };
    let names = entries
        .iter()
        .filter(|entry| entry.kind == kind && !is_hidden(entry.name()))
        .map(|entry| utf8_name(entry.name()))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(backend = backend.name(), path = %path_label(path), ?kind, count = names.len(), "Scanned directory");
    Ok(names)
}

/// Returns `true` if `path` is a directory.
pub(crate) async fn is_directory(backend: &BackendHandle, path: &Path) -> Result<bool> {
    backend.is_dir(path).await.or_raise(|| ErrorKind::Storage)
}

/// Every visible file below the chapter directories of `slug`, in walk order.
///
/// Files sitting directly in the collection directory are not pages of any
/// chapter and are skipped, as is anything with a hidden path component.
pub(crate) async fn chapter_files(backend: &BackendHandle, slug: &str) -> Result<Vec<ChapterFile>> {
    let root = Path::new(slug);
    let entries = backend.walk_all(root).await.or_raise(|| ErrorKind::Storage)?;
    let mut files = Vec::new();
    for entry in entries {
        if let Some(file) = chapter_file(root, &entry)? {
            files.push(file);
        }
    }
    tracing::debug!(backend = backend.name(), slug, count = files.len(), "Walked collection");
    Ok(files)
}

fn chapter_file(root: &Path, entry: &Entry) -> Result<Option<ChapterFile>> {
    let Ok(relative) = entry.path.strip_prefix(root) else {
        return Ok(None);
    };
    if !entry.is_file() || relative.components().count() < 2 || relative.iter().any(is_hidden) {
        return Ok(None);
    }
    let (Some(chapter), Some(file)) = (entry.parent_name(), entry.path.file_name()) else {
        return Ok(None);
    };
    Ok(Some(ChapterFile {
        chapter: utf8_name(chapter)?.replace(' ', "_"),
        file: utf8_name(file)?,
    }))
}
