//! Client-side query caching.

mod cache;

pub use cache::{QueryCache, QueryKey, QueryState, DEFAULT_MAX_ENTRIES, DEFAULT_STALE_TIME};
