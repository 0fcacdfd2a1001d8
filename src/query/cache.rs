//! Keyed cache of query results with a staleness window.
//!
//! A result younger than the staleness window is returned without calling
//! the fetcher. Anything older is refetched exactly once (no retries) and the
//! fresh value replaces it. Failed fetches are returned to the caller and
//! never stored, so the previous value (if any) stays until the next success.
//!
//! Entries are type-erased so one cache serves every query; a lookup with a
//! different type than the one stored behaves like a miss.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default staleness window: 60 seconds
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Default maximum number of cached queries
pub const DEFAULT_MAX_ENTRIES: usize = 1_000;

// =============================================================================
// Query Key
// =============================================================================

/// Identifies one cached query: a resource name plus an optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Arc<str>,
    filter: Option<String>,
}

impl QueryKey {
    /// Key for `resource` narrowed by `filter`.
    pub fn new(resource: impl Into<Arc<str>>, filter: Option<String>) -> Self {
        Self {
            resource: resource.into(),
            filter,
        }
    }

    /// Key for `resource` with no filter.
    pub fn resource_only(resource: impl Into<Arc<str>>) -> Self {
        Self::new(resource, None)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}/{}", self.resource, filter),
            None => write!(f, "{}", self.resource),
        }
    }
}

// =============================================================================
// Query Cache
// =============================================================================

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

/// Snapshot of a cached query.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Last successfully fetched value
    pub data: T,

    /// When `data` was fetched
    pub fetched_at: Instant,

    /// Whether `data` is older than the staleness window
    pub is_stale: bool,
}

/// LRU-bounded query cache shared across async tasks via `Arc`.
pub struct QueryCache {
    entries: RwLock<LruCache<QueryKey, Entry>>,
    stale_time: Duration,
}

impl QueryCache {
    /// Cache with the default staleness window and capacity.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_STALE_TIME, DEFAULT_MAX_ENTRIES)
    }

    /// Cache with an explicit staleness window and capacity.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_config(stale_time: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            stale_time,
        }
    }

    /// The staleness window.
    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Return the cached value for `key`, or run `fetcher` if there is none
    /// or it is stale.
    ///
    /// The lock is not held while `fetcher` runs; two concurrent misses on
    /// the same key both fetch and the later store wins.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(state) = self.peek::<T>(&key).await {
            if !state.is_stale {
                debug!(key = %key, "Query cache hit");
                return Ok(state.data);
            }
            debug!(key = %key, "Cached query is stale, refetching");
        }

        let value = fetcher().await?;

        let entry = Entry {
            value: Arc::new(value.clone()),
            fetched_at: Instant::now(),
        };
        self.entries.write().await.put(key, entry);

        Ok(value)
    }

    /// Current state of `key` without fetching. Marks the entry as recently used.
    pub async fn peek<T>(&self, key: &QueryKey) -> Option<QueryState<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut entries = self.entries.write().await;
        let entry = entries.get(key)?;
        let data = entry.value.downcast_ref::<T>()?.clone();

        Some(QueryState {
            data,
            fetched_at: entry.fetched_at,
            is_stale: entry.fetched_at.elapsed() >= self.stale_time,
        })
    }

    /// Drop one cached query. Returns whether it was present.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries.write().await.pop(key).is_some()
    }

    /// Drop every cached query for `resource`, whatever its filter.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_resource(&self, resource: &str) -> usize {
        let mut entries = self.entries.write().await;
        let keys: Vec<QueryKey> = entries
            .iter()
            .filter(|(key, _)| key.resource() == resource)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached queries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_time", &self.stale_time)
            .finish_non_exhaustive()
    }
}
