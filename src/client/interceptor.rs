//! Request/response interceptors with scoped registration.
//!
//! Interceptors are attached to an [`Interceptors`] list and identified by an
//! [`InterceptorId`]. Detaching is idempotent. Two helpers make registration a
//! scoped resource:
//!
//! - [`InterceptorGuard`] detaches its interceptor when dropped.
//! - [`ScopedInterceptor`] keeps at most one registration per scope and swaps
//!   it atomically whenever its dependency changes.
//!
//! ```text
//! bind("/")        -> attach #0
//! bind("/")        -> no-op (same dependency)
//! bind("/posts")   -> detach #0, attach #1
//! release()        -> detach #1
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use reqwest::{Request, Response};
use tracing::debug;

use crate::error::ApiError;

// =============================================================================
// Interceptor Traits
// =============================================================================

/// Hook invoked on every outgoing request before it is sent.
pub trait RequestInterceptor: Send + Sync {
    /// Mutate the outgoing request in place.
    fn intercept(&self, request: &mut Request);
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut Request) + Send + Sync,
{
    fn intercept(&self, request: &mut Request) {
        self(request)
    }
}

/// Hook invoked on every response (or transport failure).
pub trait ResponseInterceptor: Send + Sync {
    /// Called for successful responses. Does nothing by default.
    fn on_response(&self, _response: &Response) {}

    /// Called for failed requests before the error reaches the caller.
    fn on_error(&self, error: &ApiError);
}

// =============================================================================
// Interceptor List
// =============================================================================

/// Identifier handed out when an interceptor is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

/// Ordered list of interceptors of one kind.
pub struct Interceptors<T: ?Sized> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(InterceptorId, Arc<T>)>>,
}

impl<T: ?Sized> Interceptors<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Attach an interceptor. It runs after every interceptor attached before it.
    pub fn attach(&self, interceptor: Arc<T>) -> InterceptorId {
        let id = InterceptorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, interceptor));
        id
    }

    /// Attach an interceptor and return a guard that detaches it on drop.
    pub fn attach_guarded(self: &Arc<Self>, interceptor: Arc<T>) -> InterceptorGuard<T> {
        let id = self.attach(interceptor);
        InterceptorGuard {
            list: Arc::downgrade(self),
            id,
            detached: false,
        }
    }

    /// Detach an interceptor.
    ///
    /// Returns `false` if it was not attached (already detached or unknown).
    pub fn detach(&self, id: InterceptorId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Copy of the currently attached interceptors, in order.
    ///
    /// Callers run interceptors from the snapshot so no lock is held while
    /// user code executes.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .iter()
            .map(|(_, interceptor)| Arc::clone(interceptor))
            .collect()
    }

    /// Number of attached interceptors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no interceptor is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T: ?Sized> Default for Interceptors<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Interceptors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("attached", &self.len())
            .finish()
    }
}

// =============================================================================
// Scoped Registration
// =============================================================================

/// Detaches its interceptor when dropped.
#[must_use = "dropping the guard detaches the interceptor immediately"]
pub struct InterceptorGuard<T: ?Sized> {
    list: Weak<Interceptors<T>>,
    id: InterceptorId,
    detached: bool,
}

impl<T: ?Sized> InterceptorGuard<T> {
    /// Identifier of the guarded registration.
    pub fn id(&self) -> InterceptorId {
        self.id
    }

    /// Detach now. Safe to call more than once.
    pub fn detach(&mut self) -> bool {
        if self.detached {
            return false;
        }
        self.detached = true;

        match self.list.upgrade() {
            Some(list) => list.detach(self.id),
            None => false,
        }
    }
}

impl<T: ?Sized> Drop for InterceptorGuard<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// One registration slot whose interceptor is rebuilt when a dependency changes.
///
/// The slot lock is held across detach and attach, so concurrent rebinding
/// never leaves two registrations alive for the same scope.
pub struct ScopedInterceptor<D, T: ?Sized> {
    list: Arc<Interceptors<T>>,
    current: Mutex<Option<(D, InterceptorGuard<T>)>>,
}

impl<D: PartialEq, T: ?Sized> ScopedInterceptor<D, T> {
    /// Create an unbound slot on `list`.
    pub fn new(list: Arc<Interceptors<T>>) -> Self {
        Self {
            list,
            current: Mutex::new(None),
        }
    }

    /// Bind the slot to `dependency`.
    ///
    /// If the slot is already bound to an equal dependency nothing happens and
    /// `false` is returned. Otherwise the previous registration is detached,
    /// `make` builds the replacement, and it is attached.
    pub fn bind<F>(&self, dependency: D, make: F) -> bool
    where
        F: FnOnce(&D) -> Arc<T>,
    {
        let mut current = self.current.lock();

        if matches!(current.as_ref(), Some((bound, _)) if *bound == dependency) {
            return false;
        }

        if let Some((_, mut previous)) = current.take() {
            previous.detach();
            debug!(id = ?previous.id(), "Detached interceptor before rebinding");
        }

        let guard = self.list.attach_guarded(make(&dependency));
        debug!(id = ?guard.id(), "Attached interceptor");
        *current = Some((dependency, guard));
        true
    }

    /// Detach the current registration, if any.
    pub fn release(&self) -> bool {
        match self.current.lock().take() {
            Some((_, mut guard)) => guard.detach(),
            None => false,
        }
    }

    /// Whether the slot currently holds a registration.
    pub fn is_bound(&self) -> bool {
        self.current.lock().is_some()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Request and response interceptor lists shared by a client context.
#[derive(Debug, Default)]
pub struct InterceptorRegistry {
    request: Arc<Interceptors<dyn RequestInterceptor>>,
    response: Arc<Interceptors<dyn ResponseInterceptor>>,
}

impl InterceptorRegistry {
    /// Create a registry with no interceptors.
    pub fn new() -> Self {
        Self::default()
    }

    /// The request interceptor list.
    pub fn request(&self) -> &Arc<Interceptors<dyn RequestInterceptor>> {
        &self.request
    }

    /// The response interceptor list.
    pub fn response(&self) -> &Arc<Interceptors<dyn ResponseInterceptor>> {
        &self.response
    }

    pub(crate) fn apply_request(&self, request: &mut Request) {
        for interceptor in self.request.snapshot() {
            interceptor.intercept(request);
        }
    }

    pub(crate) fn notify_response(&self, response: &Response) {
        for interceptor in self.response.snapshot() {
            interceptor.on_response(response);
        }
    }

    pub(crate) fn notify_error(&self, error: &ApiError) {
        for interceptor in self.response.snapshot() {
            interceptor.on_error(error);
        }
    }
}
