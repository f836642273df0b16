//! In-memory storage backend for testing.

use super::EntryStream;
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::{Entry, EntryKind};
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// The tree lives in a [`BTreeMap`] behind a [`RwLock`], so listings come
/// back in a stable (sorted) order and the tree can be changed between calls.
/// Every [`list_dir`](StorageBackend::list_dir) and
/// [`walk`](StorageBackend::walk) bumps a counter, which lets tests prove that
/// a cached result didn't touch storage.
///
/// # Examples
///
/// ```
/// use shelf_storage::backend::MockBackend;
/// use shelf_storage::StorageBackend;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files(["berserk/1/1.png", "berserk/1/2.png"]);
/// assert!(backend.is_dir(Path::new("berserk/1")).await?);
/// assert_eq!(backend.list_calls(), 0);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    tree: RwLock<BTreeMap<PathBuf, EntryKind>>,
    list_calls: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files. Parent directories are
    /// created implicitly.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut tree = BTreeMap::new();
        for path in files {
            Self::insert(&mut tree, path.into(), EntryKind::File);
        }
        Self {
            name: "mock".to_string(),
            tree: RwLock::new(tree),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Add empty directories to the tree.
    pub fn with_dirs(self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut tree = self.tree.into_inner();
        for path in dirs {
            Self::insert(&mut tree, path.into(), EntryKind::Directory);
        }
        Self { tree: RwLock::new(tree), ..self }
    }

    /// Add a file after construction (its parents are created too).
    pub async fn add_file(&self, path: impl Into<PathBuf>) {
        Self::insert(&mut *self.tree.write().await, path.into(), EntryKind::File);
    }

    /// Remove a path and everything below it.
    pub async fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.tree.write().await.retain(|p, _| !p.starts_with(path));
    }

    /// How many directory listings and walks have been performed.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn insert(tree: &mut BTreeMap<PathBuf, EntryKind>, path: PathBuf, kind: EntryKind) {
        let Ok(validated) = validate_path(&path) else {
            // The panic here is DELIBERATE. MockBackend is intended to be
            // used in tests; panics are expected. There is no error result.
            panic!("MockBackend: invalid path {}", path.display());
        };
        for ancestor in validated.ancestors().skip(1).filter(|a| !a.as_os_str().is_empty()) {
            tree.insert(ancestor.to_path_buf(), EntryKind::Directory);
        }
        tree.insert(validated, kind);
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_dir(&self, path: Option<&Path>) -> Result<Vec<Entry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let parent = path.map(validate_path).transpose()?.unwrap_or_default();
        let guard = self.tree.read().await;
        if !parent.as_os_str().is_empty() {
            match guard.get(&parent) {
                Some(EntryKind::Directory) => {},
                Some(EntryKind::File) => exn::bail!(ErrorKind::NotADirectory(parent)),
                None => exn::bail!(ErrorKind::NotFound(parent)),
            }
        }
        Ok(guard
            .iter()
            .filter(|(p, _)| p.parent() == Some(parent.as_path()))
            .map(|(p, kind)| Entry::new(p.clone(), *kind))
            .collect())
    }

    fn walk<'a>(&'a self, prefix: &'a Path) -> EntryStream<'a> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let prefix = match validate_path(prefix) {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let files: Vec<PathBuf> = {
                let guard = self.tree.read().await;
                guard
                    .iter()
                    .filter(|(p, kind)| **kind == EntryKind::File && p.starts_with(&prefix))
                    .map(|(p, _)| p.clone())
                    .collect()
            };
            for path in files {
                yield Ok(Entry::file(path));
            }
        })
    }

    async fn kind(&self, path: &Path) -> Result<Option<EntryKind>> {
        let path = validate_path(path)?;
        Ok(self.tree.read().await.get(&path).copied())
    }
}
