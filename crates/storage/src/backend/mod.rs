//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the read-only view of a
//! library tree that the catalog scans. Backends know nothing about
//! collections or chapters; they only list directories.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::{Entry, EntryKind};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;

/// Unified interface for library storage.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation. `None` always refers to the root itself.
///
/// # Hidden entries
/// Backends return *everything*, dotfiles included. Filtering is the job of
/// the caller, which knows what it is looking for.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelf_storage::{StorageBackend, error::Result};
///
/// async fn count_chapters(backend: &dyn StorageBackend, slug: &str) -> Result<usize> {
///     let entries = backend.list_dir(Some(Path::new(slug))).await?;
///     Ok(entries.iter().filter(|e| e.is_dir()).count())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List the immediate children of a directory.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// directory does not exist, and
    /// [`NotADirectory`](crate::error::ErrorKind::NotADirectory) if the path
    /// is a file. Entry order is whatever the backend produces.
    async fn list_dir(&self, path: Option<&Path>) -> Result<Vec<Entry>>;

    /// Stream every file below `prefix`, recursively.
    ///
    /// Directories are descended into but not yielded. A prefix that does not
    /// exist yields an empty stream, not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use shelf_storage::{StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.walk(Path::new("berserk"));
    /// while let Some(entry) = stream.try_next().await? {
    ///     println!("{}", entry.path.display());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn walk<'a>(&'a self, prefix: &'a Path) -> EntryStream<'a>;

    /// Collect [`walk()`](Self::walk) into a [`Vec`].
    async fn walk_all(&self, prefix: &Path) -> Result<Vec<Entry>> {
        self.walk(prefix).try_collect().await
    }

    /// What lives at `path`, or `None` if nothing does.
    async fn kind(&self, path: &Path) -> Result<Option<EntryKind>>;

    /// Returns `true` if `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> Result<bool> {
        Ok(self.kind(path).await? == Some(EntryKind::Directory))
    }
}
