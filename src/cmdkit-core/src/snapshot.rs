//! Copy-on-write snapshots for the shared registries.
//!
//! Readers take an `Arc` of the current value and walk it without holding the
//! lock. Writers build the next value off to the side and swap it in whole.

use std::sync::Arc;

use parking_lot::RwLock;

pub(crate) struct Snapshot<T> {
    current: RwLock<Arc<T>>,
}

impl<T: Clone> Snapshot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    pub(crate) fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Apply an infallible change.
    pub(crate) fn update<R>(&self, change: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.current.write();
        change(Arc::make_mut(&mut guard))
    }

    /// Apply a change that may fail. Nothing is published on error.
    pub(crate) fn try_update<R, E>(
        &self,
        change: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut guard = self.current.write();
        let mut next = T::clone(&guard);
        let result = change(&mut next)?;
        *guard = Arc::new(next);
        Ok(result)
    }
}
