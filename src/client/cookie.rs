//! Process-wide cookie storage for the client layer.
//!
//! Writers never coordinate: the last `set` or `remove` wins.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared, cloneable cookie store.
///
/// Clones share the same underlying map, so a cookie cleared by the response
/// interceptor is immediately invisible to the request interceptor.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    cookies: Arc<RwLock<HashMap<String, String>>>,
}

impl CookieStore {
    /// Create an empty cookie store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cookie value by name.
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.read().get(name).cloned()
    }

    /// Set a cookie, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.write().insert(name.into(), value.into());
    }

    /// Remove a cookie. Returns the previous value, if any.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies.write().remove(name)
    }

    /// Check whether a cookie is present.
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.read().contains_key(name)
    }
}
