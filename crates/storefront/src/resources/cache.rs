//! Per-view entity cache with loading and error state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, Operation, ResourceError};
use crate::sync::ViewScope;

/// A backend entity that can be cached by id.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: PartialEq + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;
}

/// Cached list of entities owned by one view.
///
/// Clones share the same state. Every write is dropped once the bound
/// [`ViewScope`] has unmounted, so a response that resolves late never
/// touches a torn-down view.
pub struct Cache<T> {
    state: Arc<Mutex<CacheState<T>>>,
    scope: ViewScope,
}

struct CacheState<T> {
    items: Vec<T>,
    in_flight: usize,
    error: Option<String>,
}

impl<T> Clone for Cache<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            scope: self.scope.clone(),
        }
    }
}

impl<T: Entity + fmt::Debug> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Cache")
            .field("items", &state.items)
            .field("in_flight", &state.in_flight)
            .field("error", &state.error)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> Cache<T> {
    #[must_use]
    pub fn new(scope: ViewScope) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                items: Vec::new(),
                in_flight: 0,
                error: None,
            })),
            scope,
        }
    }

    #[must_use]
    pub const fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Snapshot of the cached entities, in server order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// At least one operation of this cache's owner is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    /// Message of the last failed operation, cleared when the next starts.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    // =========================================================================
    // Writes (dropped after unmount)
    // =========================================================================

    /// Mark an operation as started. Loading lasts until the guard drops.
    pub(crate) fn begin(&self) -> InFlight<T> {
        let counted = self.with_mounted(|state| {
            state.in_flight += 1;
            state.error = None;
        });
        InFlight {
            cache: self.clone(),
            counted,
        }
    }

    pub(crate) fn record_error(&self, message: &str) {
        self.with_mounted(|state| state.error = Some(message.to_string()));
    }

    /// Apply `f` to the list if the view is still mounted.
    pub(crate) fn mutate(&self, f: impl FnOnce(&mut Vec<T>)) -> bool {
        self.with_mounted(|state| f(&mut state.items))
    }

    pub(crate) fn replace_all(&self, items: Vec<T>) {
        self.mutate(|current| *current = items);
    }

    pub(crate) fn append(&self, item: T) {
        self.mutate(|items| items.push(item));
    }

    /// Replace the entity with the same id in place. Unknown ids are ignored.
    pub(crate) fn replace(&self, item: T) {
        self.mutate(|items| {
            if let Some(slot) = items.iter_mut().find(|existing| existing.id() == item.id()) {
                *slot = item;
            }
        });
    }

    pub(crate) fn remove(&self, id: &T::Id) {
        self.mutate(|items| items.retain(|item| item.id() != id));
    }

    /// Finish an operation: on success run `apply`, on failure record the
    /// user-facing message. Either way the outcome is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the failure as a [`ResourceError`] described by `op`.
    pub(crate) fn settle<R>(
        &self,
        op: Operation,
        result: Result<R, ApiError>,
        apply: impl FnOnce(&Self, &R),
    ) -> Result<R, ResourceError> {
        match result {
            Ok(value) => {
                apply(self, &value);
                Ok(value)
            }
            Err(e) => {
                let err = ResourceError::new(e, op);
                tracing::debug!(action = op.action, subject = op.subject, error = %err, "Operation failed");
                self.record_error(err.message());
                Err(err)
            }
        }
    }

    fn with_mounted(&self, f: impl FnOnce(&mut CacheState<T>)) -> bool {
        let mut state = self.lock();
        // Checked under the lock so nothing lands after an unmount is observed.
        if !self.scope.is_mounted() {
            return false;
        }
        f(&mut state);
        true
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Guard for one in-flight operation.
pub(crate) struct InFlight<T: Entity> {
    cache: Cache<T>,
    counted: bool,
}

impl<T: Entity> Drop for InFlight<T> {
    fn drop(&mut self) {
        if self.counted {
            self.cache.with_mounted(|state| {
                state.in_flight = state.in_flight.saturating_sub(1);
            });
        }
    }
}
