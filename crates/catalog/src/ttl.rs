//! Time-bounded memoization of directory scans.
//!
//! Each cached catalog operation owns one [`TtlCache`], keyed by a small
//! struct holding that operation's arguments. Entries are never evicted; they
//! are only replaced once they have gone stale and somebody asks again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    inserted: Instant,
}

/// A typed cache whose entries expire a fixed [`Duration`] after insertion.
///
/// Concurrent misses on the same key are *not* coalesced: both callers run
/// their computation and the last one to finish wins the slot. Catalog scans
/// are idempotent reads, so the only cost is a redundant scan.
///
/// A zero TTL turns the cache into a pass-through.
///
/// # Examples
///
/// ```
/// use shelf_catalog::TtlCache;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: TtlCache<u32, String> = TtlCache::new("squares", Duration::from_secs(60));
/// let value = cache
///     .get_or_compute(4, || async { Ok::<_, std::convert::Infallible>("16".to_string()) })
///     .await
///     .unwrap();
/// assert_eq!(value, "16");
/// assert_eq!(cache.get(&4).await.as_deref(), Some("16"));
/// # }
/// ```
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// `name` identifies the cached operation in log output.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the stored value if it was inserted less than one TTL ago.
    pub async fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.read().await;
        let slot = slots.get(key)?;
        (slot.inserted.elapsed() < self.ttl).then(|| slot.value.clone())
    }

    /// Stores `value`, replacing whatever was there and restarting its TTL.
    pub async fn insert(&self, key: K, value: V) {
        let slot = Slot {
            value,
            inserted: Instant::now(),
        };
        self.slots.write().await.insert(key, slot);
    }

    /// Returns the fresh cached value for `key`, or runs `compute`, stores its
    /// result and returns it.
    ///
    /// Errors from `compute` are passed straight through and are never
    /// cached, so the next call tries again.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::trace!(cache = self.name, ?key, "Cache hit");
            return Ok(value);
        }
        tracing::debug!(cache = self.name, ?key, "Cache miss; computing");
        let value = compute().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
