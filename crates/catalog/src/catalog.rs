use crate::error::{ErrorKind, Result};
use crate::order::{self, compare_combined};
use crate::ranks::RankStore;
use crate::scan;
use crate::ttl::TtlCache;
use shelf_storage::{BackendHandle, EntryKind, is_hidden, validate_segment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CollectionKey {
    slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChapterKey {
    slug: String,
    chapter: String,
}

/// A page in reading order.
///
/// In a chapter listing, `index` is the number parsed from the file name; in
/// the combined view it is the 1-based position in the flattened sequence
/// and `name` is `"<chapter>/<file>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: i64,
    pub name: String,
}
impl Page {
    pub fn new(index: i64, name: impl Into<String>) -> Self {
        Self { index, name: name.into() }
    }
}

/// Cached, ordered view of a library laid out as
/// `<root>/<collection>/<chapter>/<page>`.
///
/// Every read goes through a per-operation [`TtlCache`], so results may be up
/// to one TTL old. Listers assume the caller has already checked existence
/// with [`collection_exists`](Self::collection_exists) or
/// [`chapter_exists`](Self::chapter_exists), but still fail cleanly with
/// [`ErrorKind::NotFound`] if it didn't.
///
/// # Examples
///
/// ```
/// use shelf_catalog::Catalog;
/// use shelf_storage::backend::MockBackend;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = Arc::new(MockBackend::with_files(["berserk/2/1.png", "berserk/10/1.png", "berserk/1 - Intro/1.png"]));
/// let catalog = Catalog::new(backend);
/// assert!(catalog.collection_exists("berserk").await?);
/// assert_eq!(catalog.list_chapters("berserk").await?, ["1 - Intro", "2", "10"]);
/// # Ok(())
/// # }
/// ```
pub struct Catalog {
    backend: BackendHandle,
    ranks: Arc<RankStore>,
    collections: TtlCache<(), Vec<String>>,
    collection_exists: TtlCache<CollectionKey, bool>,
    chapter_exists: TtlCache<ChapterKey, bool>,
    chapters: TtlCache<CollectionKey, Vec<String>>,
    pages: TtlCache<ChapterKey, Vec<Page>>,
    combined: TtlCache<CollectionKey, Vec<Page>>,
}

impl Catalog {
    /// How long results are served from cache unless configured otherwise.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(backend: BackendHandle) -> Self {
        Self::with_ttl(backend, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(backend: BackendHandle, ttl: Duration) -> Self {
        Self {
            backend,
            ranks: Arc::new(RankStore::new()),
            collections: TtlCache::new("collections", ttl),
            collection_exists: TtlCache::new("collection_exists", ttl),
            chapter_exists: TtlCache::new("chapter_exists", ttl),
            chapters: TtlCache::new("chapters", ttl),
            pages: TtlCache::new("pages", ttl),
            combined: TtlCache::new("combined", ttl),
        }
    }

    /// Share synthetic chapter ranks with another catalog (or keep them
    /// across catalog rebuilds).
    pub fn with_ranks(mut self, ranks: Arc<RankStore>) -> Self {
        self.ranks = ranks;
        self
    }

    pub fn ranks(&self) -> &Arc<RankStore> {
        &self.ranks
    }

    /// Names of every collection in the library, sorted by name.
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.collections
            .get_or_compute((), || async {
                let mut names = match scan::list_names(&self.backend, None, EntryKind::Directory).await {
                    Ok(names) => names,
                    // An absent library is an empty one.
                    Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => vec![],
                    Err(e) => return Err(e),
                };
                names.sort();
                Ok(names)
            })
            .await
    }

    /// Returns `true` if `slug` is a directory directly under the library
    /// root. Hidden names and anything that isn't a single plain name never
    /// exist.
    #[instrument(skip(self))]
    pub async fn collection_exists(&self, slug: &str) -> Result<bool> {
        let Some(path) = Self::relative(&[slug]) else {
            return Ok(false);
        };
        let key = CollectionKey { slug: slug.to_string() };
        self.collection_exists.get_or_compute(key, || scan::is_directory(&self.backend, &path)).await
    }

    /// Returns `true` if `chapter` is a directory directly under the
    /// collection `slug`.
    #[instrument(skip(self))]
    pub async fn chapter_exists(&self, slug: &str, chapter: &str) -> Result<bool> {
        let Some(path) = Self::relative(&[slug, chapter]) else {
            return Ok(false);
        };
        let key = ChapterKey {
            slug: slug.to_string(),
            chapter: chapter.to_string(),
        };
        self.chapter_exists.get_or_compute(key, || scan::is_directory(&self.backend, &path)).await
    }

    /// Chapters of `slug` in natural chapter order.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] if the collection doesn't exist.
    /// - [`ErrorKind::MalformedName`] if any chapter name isn't a number
    ///   (optionally followed by `" - "` and a title).
    #[instrument(skip(self))]
    pub async fn list_chapters(&self, slug: &str) -> Result<Vec<String>> {
        let path = Self::relative_or_not_found(&[slug])?;
        let key = CollectionKey { slug: slug.to_string() };
        self.chapters
            .get_or_compute(key, || async {
                let names = scan::list_names(&self.backend, Some(path.as_path()), EntryKind::Directory).await?;
                order::sort_chapters(names)
            })
            .await
    }

    /// Pages of one chapter, ordered by the number their file name starts
    /// with. Pages sharing a number keep their listing order.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] if the chapter doesn't exist.
    /// - [`ErrorKind::MalformedName`] if any file name doesn't start with an
    ///   integer.
    #[instrument(skip(self))]
    pub async fn list_pages(&self, slug: &str, chapter: &str) -> Result<Vec<Page>> {
        let path = Self::relative_or_not_found(&[slug, chapter])?;
        let key = ChapterKey {
            slug: slug.to_string(),
            chapter: chapter.to_string(),
        };
        self.pages
            .get_or_compute(key, || async {
                let names = scan::list_names(&self.backend, Some(path.as_path()), EntryKind::File).await?;
                let mut pages = names
                    .into_iter()
                    .map(|name| -> Result<Page> { Ok(Page::new(order::page_number(&name)?, name)) })
                    .collect::<Result<Vec<_>>>()?;
                pages.sort_by_key(|page| page.index);
                Ok(pages)
            })
            .await
    }

    /// Every page of every chapter of `slug`, flattened into one reading
    /// order and numbered from 1.
    ///
    /// Chapters are ranked by the number their (underscored) name starts
    /// with; chapters without one get a synthetic negative rank from the
    /// [`RankStore`] and therefore come first. Within a chapter, pages are
    /// ordered by number.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] if `slug` isn't a valid collection name.
    /// - [`ErrorKind::MalformedName`] if any page name isn't an integer with
    ///   an extension, or a chapter's leading number is unparseable.
    #[instrument(skip(self))]
    pub async fn list_combined(&self, slug: &str) -> Result<Vec<Page>> {
        Self::relative_or_not_found(&[slug])?;
        let key = CollectionKey { slug: slug.to_string() };
        self.combined.get_or_compute(key, || self.compute_combined(slug)).await
    }

    async fn compute_combined(&self, slug: &str) -> Result<Vec<Page>> {
        let files = scan::chapter_files(&self.backend, slug).await?;
        let mut keyed = Vec::with_capacity(files.len());
        {
            // Held for the whole computation so that the first computation to
            // see an unnumbered chapter is the one that ranks it.
            let mut ranks = self.ranks.lock(slug).await;
            for file in files {
                let rank = match order::leading_number(&file.chapter)? {
                    Some(rank) => rank,
                    None => ranks.rank_of(&file.chapter) as f64,
                };
                let page = order::combined_page_number(&file.file)?;
                keyed.push(((rank, page), format!("{}/{}", file.chapter, file.file)));
            }
        }
        keyed.sort_by(|(a, _), (b, _)| compare_combined(a, b));
        Ok(keyed.into_iter().zip(1..).map(|((_, name), index)| Page::new(index, name)).collect())
    }

    /// Joins validated, visible names into a relative path.
    fn relative(names: &[&str]) -> Option<PathBuf> {
        names
            .iter()
            .map(|name| validate_segment(name).ok().filter(|name| !is_hidden(name)).map(Path::new))
            .collect()
    }

    fn relative_or_not_found(names: &[&str]) -> Result<PathBuf> {
        match Self::relative(names) {
            Some(path) => Ok(path),
            None => exn::bail!(ErrorKind::NotFound(names.join("/"))),
        }
    }
}
