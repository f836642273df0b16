//! Synthetic ranks for chapters without a number.
//!
//! The combined view needs *some* position for chapters called `"Extra"` or
//! `"Omake"`. They are handed negative ranks in the order they are first
//! seen: the first gets −2, the next −3, and so on. Since lower ranks sort
//! earlier, a chapter seen later ends up *before* the ones seen earlier, and
//! all of them end up before the numbered chapters.
//!
//! Ranks are remembered for the lifetime of the [`RankStore`], so the combined
//! order of a collection never reshuffles between calls.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Rank state of a single collection.
#[derive(Debug)]
pub struct ChapterRanks {
    counter: i64,
    assigned: HashMap<String, i64>,
}
impl Default for ChapterRanks {
    fn default() -> Self {
        Self {
            counter: -1,
            assigned: HashMap::new(),
        }
    }
}
impl ChapterRanks {
    /// Rank of `chapter`, assigning the next free one if it has none yet.
    pub fn rank_of(&mut self, chapter: &str) -> i64 {
        if let Some(rank) = self.assigned.get(chapter) {
            return *rank;
        }
        self.counter -= 1;
        self.assigned.insert(chapter.to_string(), self.counter);
        tracing::info!(chapter, rank = self.counter, "Assigned synthetic rank to unnumbered chapter");
        self.counter
    }

    /// Rank previously assigned to `chapter`, if any.
    pub fn get(&self, chapter: &str) -> Option<i64> {
        self.assigned.get(chapter).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Per-collection [`ChapterRanks`], each behind its own lock.
///
/// Holding the guard returned by [`lock`](Self::lock) for the whole of one
/// combined-order computation means two concurrent computations can't both
/// claim the same rank: whoever locks first wins it.
#[derive(Debug, Default)]
pub struct RankStore {
    collections: Mutex<HashMap<String, Arc<Mutex<ChapterRanks>>>>,
}
impl RankStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to the rank state of `slug`, creating it on first use.
    pub async fn lock(&self, slug: &str) -> OwnedMutexGuard<ChapterRanks> {
        let ranks = {
            let mut collections = self.collections.lock().await;
            Arc::clone(collections.entry(slug.to_string()).or_default())
        };
        ranks.lock_owned().await
    }
}
