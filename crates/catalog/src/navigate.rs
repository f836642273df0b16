//! Previous/next chapter lookups for readers paging through a collection.

use crate::Catalog;
use crate::error::{ErrorKind, Result};
use tracing::instrument;

/// Where a reader ends up when leaving a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Neighbour {
    /// An adjacent chapter, by name.
    Chapter(String),
    /// There is no chapter in that direction; go back to the collection.
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Previous,
    Next,
}

impl Catalog {
    /// The chapter before `chapter` in natural chapter order.
    ///
    /// # Errors
    /// [`ErrorKind::NotFound`] if `chapter` isn't one of the chapters of
    /// `slug`, plus anything [`list_chapters`](Self::list_chapters) raises.
    #[instrument(skip(self))]
    pub async fn previous_chapter(&self, slug: &str, chapter: &str) -> Result<Neighbour> {
        self.neighbour(slug, chapter, Direction::Previous).await
    }

    /// The chapter after `chapter` in natural chapter order.
    ///
    /// # Errors
    /// Same as [`previous_chapter`](Self::previous_chapter).
    #[instrument(skip(self))]
    pub async fn next_chapter(&self, slug: &str, chapter: &str) -> Result<Neighbour> {
        self.neighbour(slug, chapter, Direction::Next).await
    }

    async fn neighbour(&self, slug: &str, chapter: &str, direction: Direction) -> Result<Neighbour> {
        let chapters = self.list_chapters(slug).await?;
        let Some(position) = chapters.iter().position(|c| c == chapter) else {
            exn::bail!(ErrorKind::NotFound(format!("{slug}/{chapter}")));
        };
        let adjacent = match direction {
            Direction::Previous => position.checked_sub(1).and_then(|p| chapters.get(p)),
            Direction::Next => chapters.get(position + 1),
        };
        Ok(adjacent.map_or(Neighbour::Collection, |c| Neighbour::Chapter(c.clone())))
    }
}
