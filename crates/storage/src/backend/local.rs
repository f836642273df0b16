//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for the local
//! filesystem. Directories are read using `tokio::fs` for async I/O.

use crate::backend::EntryStream;
use crate::error::{ErrorKind, Result};
use crate::models::{Entry, EntryKind};
use crate::{StorageBackend, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(Entry),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// All paths are relative to the configured root directory. Unlike a
/// writable store, the root is never created: a library that isn't there is
/// simply empty.
///
/// # Examples
///
/// ```no_run
/// use shelf_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/srv/media")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the library
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute, or [`NotADirectory`](ErrorKind::NotADirectory) if it exists
    /// but is a file.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() && !root.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(root));
        }
        if !root.exists() {
            tracing::warn!(root = %root.display(), "Library root does not exist; it will appear empty");
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative storage path (`None` is the root).
    fn absolute_path(&self, path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(self.root.join(validate_path(path)?)),
            None => Ok(self.root.clone()),
        }
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotADirectory => ErrorKind::NotADirectory(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Symlinks are followed, so a linked chapter directory lists like a
    /// real one. Anything else (sockets, broken links) is skipped.
    async fn resolve_kind(entry: &DirEntry) -> std::io::Result<Option<EntryKind>> {
        let file_type = entry.file_type().await?;
        let file_type: FileType = match file_type.is_symlink() {
            true => match fs::metadata(entry.path()).await {
                Ok(meta) => meta.file_type(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e),
            },
            false => file_type,
        };
        Ok(match (file_type.is_dir(), file_type.is_file()) {
            (true, _) => Some(EntryKind::Directory),
            (_, true) => Some(EntryKind::File),
            _ => None,
        })
    }

    async fn process_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let linked = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?.is_symlink();
        let kind = Self::resolve_kind(&entry).await.map_err(|e| Self::map_io_error(e, &path))?;
        Ok(match kind {
            // Linked directories are never walked into; a link back up the
            // tree would otherwise never end.
            Some(EntryKind::Directory) if linked => WalkEntry::Skip,
            Some(EntryKind::Directory) => WalkEntry::Descend(path),
            Some(EntryKind::File) => WalkEntry::File(Entry::file(self.relative_path(&path)?)),
            None => WalkEntry::Skip,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_dir(&self, path: Option<&Path>) -> Result<Vec<Entry>> {
        let absolute = self.absolute_path(path)?;
        let shown = path.unwrap_or_else(|| Path::new(""));
        let mut entries = fs::read_dir(&absolute).await.map_err(|e| Self::map_io_error(e, shown))?;
        let mut listed = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, shown))? {
            let entry_path = entry.path();
            let Some(kind) = Self::resolve_kind(&entry).await.map_err(|e| Self::map_io_error(e, &entry_path))? else {
                continue;
            };
            listed.push(Entry::new(self.relative_path(&entry_path)?, kind));
        }
        tracing::trace!(backend = self.name(), path = %shown.display(), entries = listed.len(), "Listed directory");
        Ok(listed)
    }

    fn walk<'a>(&'a self, prefix: &'a Path) -> EntryStream<'a> {
        let start = match self.absolute_path(Some(prefix)) {
            Ok(start) => start,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        let mut stack = vec![start];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // A prefix that doesn't exist is an empty walk.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };
                // Directories are visited in listing order.
                let mut descend = Vec::new();
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => descend.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
                stack.extend(descend.into_iter().rev());
            }
        })
    }

    async fn kind(&self, path: &Path) -> Result<Option<EntryKind>> {
        let absolute = self.absolute_path(Some(path))?;
        match fs::metadata(&absolute).await {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(meta) if meta.is_file() => Ok(Some(EntryKind::File)),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory) => Ok(None),
            Err(e) => Err(exn::Exn::from(Self::map_io_error(e, path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn touch(root: &Path, path: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        // Missing roots are allowed, they just list as empty.
        assert!(LocalBackend::new("name", temp_dir.path().join("missing")).is_ok());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "file.txt");
        let err = LocalBackend::new("name", temp_dir.path().join("file.txt")).err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        assert_eq!(backend.absolute_path(None).unwrap(), temp_dir.path());
        assert_eq!(
            backend.absolute_path(Some(Path::new("berserk/1"))).unwrap(),
            temp_dir.path().join("berserk/1")
        );
        assert!(backend.absolute_path(Some(Path::new("../etc/passwd"))).is_err());
    }

    #[tokio::test]
    async fn test_list_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "berserk/1/1.png");
        touch(temp_dir.path(), "berserk/notes.txt");
        touch(temp_dir.path(), "berserk/.hidden/1.png");
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();

        let mut entries = backend.list_dir(Some(Path::new("berserk"))).await.unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            entries,
            vec![
                Entry::directory("berserk/.hidden"),
                Entry::directory("berserk/1"),
                Entry::file("berserk/notes.txt"),
            ]
        );

        let root = backend.list_dir(None).await.unwrap();
        assert_eq!(root, vec![Entry::directory("berserk")]);
    }

    #[tokio::test]
    async fn test_list_dir_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "berserk/notes.txt");
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();

        let err = backend.list_dir(Some(Path::new("missing"))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = backend.list_dir(Some(Path::new("berserk/notes.txt"))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_walk() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "berserk/1/1.png");
        touch(temp_dir.path(), "berserk/1/2.png");
        touch(temp_dir.path(), "berserk/Extra/1.png");
        touch(temp_dir.path(), "other/1/1.png");
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();

        let mut files: Vec<_> =
            backend.walk(Path::new("berserk")).map_ok(|e| e.path).try_collect().await.unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                PathBuf::from("berserk/1/1.png"),
                PathBuf::from("berserk/1/2.png"),
                PathBuf::from("berserk/Extra/1.png"),
            ]
        );
        assert!(backend.walk_all(Path::new("missing")).await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_walk_skips_linked_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "berserk/1/1.png");
        touch(temp_dir.path(), "shared/cover.png");
        std::os::unix::fs::symlink("..", temp_dir.path().join("berserk/1/loop")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("shared/cover.png"), temp_dir.path().join("berserk/1/2.png"))
            .unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();

        let mut files: Vec<_> = backend.walk_all(Path::new("berserk")).await.unwrap().into_iter().map(|e| e.path).collect();
        files.sort();
        assert_eq!(files, vec![PathBuf::from("berserk/1/1.png"), PathBuf::from("berserk/1/2.png")]);
        // Listing still follows the link.
        assert!(backend.is_dir(Path::new("berserk/1/loop")).await.unwrap());
    }

    #[tokio::test]
    async fn test_kind() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "berserk/1/1.png");
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        assert_eq!(backend.kind(Path::new("berserk")).await.unwrap(), Some(EntryKind::Directory));
        assert_eq!(backend.kind(Path::new("berserk/1/1.png")).await.unwrap(), Some(EntryKind::File));
        assert_eq!(backend.kind(Path::new("berserk/2")).await.unwrap(), None);
        assert!(backend.is_dir(Path::new("berserk/1")).await.unwrap());
        assert!(!backend.is_dir(Path::new("berserk/1/1.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("nope")).unwrap();
        assert_eq!(backend.kind(Path::new("berserk")).await.unwrap(), None);
        let err = backend.list_dir(None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
