//! Query cache and invalidation registry
//!
//! A process-wide keyed store of fetched results, created once at start-up and
//! shared as `Arc<QueryCache>`. Writes never patch entries in place: a
//! successful mutation invalidates every entry under a declared key prefix,
//! and the next read re-fetches.
//!
//! ## Keys
//!
//! A [`CacheKey`] is an ordered list of segments. Invalidating `["getPosts"]`
//! also invalidates `["getPosts", "p1"]`.
//!
//! ## Handlers
//!
//! Invalidation handlers registered under a key run synchronously, after the
//! matching entries have been marked stale and with no cache lock held, so a
//! handler may read or refill the cache.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// =============================================================================
// Keys
// =============================================================================

/// Ordered tag grouping cached results for invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Key from its segments, outermost first.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Extend this key with one more segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Whether `self` is `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Well-known query keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKeys {
    /// `["getRecentPosts"]`, the feed
    GetRecentPosts,
    /// `["getCurrentUser"]`
    GetCurrentUser,
    /// `["getUsers"]`
    GetUsers,
    /// `["getPostById"]`, parent of per-post keys
    GetPostById,
}

impl QueryKeys {
    /// Wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetRecentPosts => "getRecentPosts",
            Self::GetCurrentUser => "getCurrentUser",
            Self::GetUsers => "getUsers",
            Self::GetPostById => "getPostById",
        }
    }

    /// Single-segment [`CacheKey`] for this query.
    pub fn key(&self) -> CacheKey {
        CacheKey::new([self.as_str()])
    }
}

impl From<QueryKeys> for CacheKey {
    fn from(key: QueryKeys) -> Self {
        key.key()
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Called with the invalidated key.
pub type InvalidationHandler = Arc<dyn Fn(&CacheKey) + Send + Sync>;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
}

/// Counts since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a fresh entry
    pub hits: u64,
    /// Reads that had to load
    pub misses: u64,
    /// Invalidation calls, matching or not
    pub invalidations: u64,
}

/// What one call to [`QueryCache::invalidate`] touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Prefix that was invalidated
    pub key: CacheKey,
    /// Entries newly marked stale
    pub entries: usize,
    /// Handlers run
    pub handlers: usize,
}

/// Shared store of query results plus the invalidation registry.
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    handlers: RwLock<HashMap<CacheKey, Vec<InvalidationHandler>>>,
    invalidation_counts: RwLock<HashMap<CacheKey, u64>>,
    stats: RwLock<CacheStats>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.read().len())
            .field("handlers", &self.handlers.read().len())
            .field("stats", &*self.stats.read())
            .finish()
    }
}

impl QueryCache {
    /// Empty cache with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, fresh.
    pub fn set<T>(&self, key: CacheKey, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries.write().insert(
            key,
            Entry {
                value: Arc::new(value),
                stale: false,
            },
        );
    }

    /// Fresh value under `key`, if present and of type `T`.
    pub fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        let entry = entries.get(key).filter(|e| !e.stale)?;
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Whether `key` holds an entry that has been invalidated.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries.read().get(key).is_some_and(|e| e.stale)
    }

    /// Whether any entry, fresh or stale, is stored under `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Return the fresh value under `key` or run `loader` and store what it
    /// yields. Failed loads leave the previous entry untouched. A load that
    /// overlaps an invalidation of `key` is returned but stored stale, so the
    /// next read fetches again.
    pub async fn fetch<T, E, F, Fut>(&self, key: CacheKey, loader: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.stats.write().hits += 1;
            return Ok(value);
        }
        self.stats.write().misses += 1;

        let generation = self.generation(&key);
        tracing::debug!(%key, generation, "cache miss, fetching");
        let value = loader().await?;

        // An invalidation that landed while loading may postdate this value.
        let mut entries = self.entries.write();
        let stale = self.generation(&key) != generation;
        if stale {
            tracing::debug!(%key, "invalidated while loading, stored stale");
        }
        entries.insert(
            key,
            Entry {
                value: Arc::new(value.clone()),
                stale,
            },
        );
        drop(entries);
        Ok(value)
    }

    /// Invalidations so far of `key` or any of its prefixes.
    fn generation(&self, key: &CacheKey) -> u64 {
        let counts = self.invalidation_counts.read();
        (0..=key.0.len())
            .filter_map(|len| counts.get(&CacheKey(key.0[..len].to_vec())))
            .sum()
    }

    /// Register `handler` to run whenever `key`, or a prefix of it, is
    /// invalidated.
    pub fn on_invalidate(&self, key: CacheKey, handler: InvalidationHandler) {
        self.handlers.write().entry(key).or_default().push(handler);
    }

    /// Mark every entry under `prefix` stale and run the matching handlers.
    pub fn invalidate(&self, prefix: &CacheKey) -> InvalidationReport {
        let entries = {
            let mut entries = self.entries.write();
            let mut marked = 0;
            for (key, entry) in entries.iter_mut() {
                if key.starts_with(prefix) && !entry.stale {
                    entry.stale = true;
                    marked += 1;
                }
            }
            // Bumped under the entries lock so `fetch` sees it before storing.
            *self
                .invalidation_counts
                .write()
                .entry(prefix.clone())
                .or_insert(0) += 1;
            marked
        };

        self.stats.write().invalidations += 1;

        let handlers: Vec<InvalidationHandler> = self
            .handlers
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .flat_map(|(_, handlers)| handlers.iter().cloned())
            .collect();

        for handler in &handlers {
            handler(prefix);
        }

        if entries == 0 && handlers.is_empty() {
            tracing::debug!(key = %prefix, "invalidation matched nothing");
        } else {
            tracing::debug!(key = %prefix, entries, handlers = handlers.len(), "invalidated");
        }

        InvalidationReport {
            key: prefix.clone(),
            entries,
            handlers: handlers.len(),
        }
    }

    /// How many times `key` itself has been invalidated.
    pub fn invalidation_count(&self, key: &CacheKey) -> u64 {
        self.invalidation_counts
            .read()
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Counters since creation.
    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn posts_key() -> CacheKey {
        QueryKeys::GetRecentPosts.key()
    }

    #[test]
    fn prefix_matching() {
        let parent = CacheKey::new(["getPostById"]);
        let child = parent.child("p1");
        assert!(child.starts_with(&parent));
        assert!(parent.starts_with(&parent));
        assert!(!parent.starts_with(&child));
        assert!(!CacheKey::new(["getPost"]).starts_with(&parent));
        assert_eq!(child.to_string(), "[getPostById, p1]");
    }

    #[test]
    fn invalidate_marks_prefix_entries_stale_only() {
        let cache = QueryCache::new();
        let by_id = QueryKeys::GetPostById.key();
        cache.set(by_id.child("p1"), 1_u32);
        cache.set(by_id.child("p2"), 2_u32);
        cache.set(posts_key(), vec![1_u32]);

        let report = cache.invalidate(&by_id);
        assert_eq!(report.entries, 2);
        assert!(cache.is_stale(&by_id.child("p1")));
        assert!(cache.get::<u32>(&by_id.child("p2")).is_none());
        assert_eq!(cache.get::<Vec<u32>>(&posts_key()), Some(vec![1]));
    }

    #[test]
    fn handlers_run_for_matching_keys() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        cache.on_invalidate(
            posts_key(),
            Arc::new(move |_: &CacheKey| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        cache.invalidate(&QueryKeys::GetCurrentUser.key());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let report = cache.invalidate(&posts_key());
        assert_eq!(report.handlers, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.invalidation_count(&posts_key()), 1);
    }

    #[test]
    fn handler_may_touch_the_cache() {
        let cache = Arc::new(QueryCache::new());
        let weak = Arc::downgrade(&cache);
        cache.on_invalidate(
            posts_key(),
            Arc::new(move |key: &CacheKey| {
                if let Some(cache) = weak.upgrade() {
                    cache.set(key.clone(), vec![9_u32]);
                }
            }),
        );
        cache.invalidate(&posts_key());
        assert_eq!(cache.get::<Vec<u32>>(&posts_key()), Some(vec![9]));
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = QueryCache::new();
        cache.set(posts_key(), 7_u64);
        assert_eq!(cache.get::<u32>(&posts_key()), None);
        assert_eq!(cache.get::<u64>(&posts_key()), Some(7));
    }

    #[tokio::test]
    async fn fetch_serves_fresh_entries_and_reloads_stale_ones() {
        let cache = QueryCache::new();
        let loads = AtomicUsize::new(0);
        let loads = &loads;
        let load = move || async move { Ok::<_, ()>(loads.fetch_add(1, Ordering::SeqCst) as u32) };

        assert_eq!(cache.fetch(posts_key(), load).await, Ok(0));
        assert_eq!(cache.fetch(posts_key(), load).await, Ok(0));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate(&posts_key());
        assert_eq!(cache.fetch(posts_key(), load).await, Ok(1));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.invalidations, 1);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_entry() {
        let cache = QueryCache::new();
        cache.set(posts_key(), 3_u32);
        cache.invalidate(&posts_key());

        let result: Result<u32, &str> = cache.fetch(posts_key(), || async { Err("offline") }).await;
        assert_eq!(result, Err("offline"));
        assert!(cache.is_stale(&posts_key()));
    }

    #[tokio::test]
    async fn load_overlapping_an_invalidation_is_stored_stale() {
        let cache = QueryCache::new();
        let release = tokio::sync::Notify::new();

        let read = cache.fetch(posts_key(), || async {
            release.notified().await;
            Ok::<_, ()>(vec!["old"])
        });
        let write = async {
            tokio::task::yield_now().await;
            cache.invalidate(&posts_key());
            release.notify_one();
        };
        let (read, ()) = tokio::join!(read, write);

        assert_eq!(read, Ok(vec!["old"]));
        assert!(cache.is_stale(&posts_key()));
        assert_eq!(cache.get::<Vec<&str>>(&posts_key()), None);

        let reloaded = cache
            .fetch(posts_key(), || async { Ok::<_, ()>(vec!["new"]) })
            .await;
        assert_eq!(reloaded, Ok(vec!["new"]));
        assert_eq!(cache.get::<Vec<&str>>(&posts_key()), Some(vec!["new"]));
    }

    #[tokio::test]
    async fn parent_invalidation_during_load_also_counts() {
        let cache = QueryCache::new();
        let by_id = QueryKeys::GetPostById.key();
        let release = tokio::sync::Notify::new();

        let read = cache.fetch(by_id.child("p1"), || async {
            release.notified().await;
            Ok::<_, ()>(1_u32)
        });
        let write = async {
            tokio::task::yield_now().await;
            cache.invalidate(&by_id);
            release.notify_one();
        };
        let _ = tokio::join!(read, write);

        assert!(cache.is_stale(&by_id.child("p1")));
    }

    proptest::proptest! {
        #[test]
        fn invalidation_touches_exactly_the_prefixed_keys(
            keys in proptest::collection::vec(proptest::collection::vec("[ab]", 1..4), 1..12),
            prefix in proptest::collection::vec("[ab]", 1..3),
        ) {
            let cache = QueryCache::new();
            for segments in &keys {
                cache.set(CacheKey::new(segments.clone()), 0_u8);
            }
            let prefix = CacheKey::new(prefix);
            cache.invalidate(&prefix);

            for segments in &keys {
                let key = CacheKey::new(segments.clone());
                proptest::prop_assert_eq!(cache.is_stale(&key), key.starts_with(&prefix));
            }
        }
    }
}
