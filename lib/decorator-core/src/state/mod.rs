//! Shared component state.

use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;

/// A holder for the latest snapshot of some shared state.
///
/// Readers get the whole snapshot that was current when they asked, and keep it for as long as they need it; writers
/// replace the snapshot wholesale. A reader never observes a mix of an old and a new snapshot, and neither side takes a
/// lock.
///
/// Clones share the same slot: a replacement through one clone is visible through all of them.
pub struct SnapshotHolder<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> SnapshotHolder<T> {
    /// Creates a new `SnapshotHolder` with the given initial snapshot.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replaces the current snapshot, returning the previous one.
    pub fn replace(&self, snapshot: T) -> Arc<T> {
        self.inner.swap(Arc::new(snapshot))
    }
}

impl<T> Clone for SnapshotHolder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SnapshotHolder<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for SnapshotHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnapshotHolder").field(&self.current()).finish()
    }
}
