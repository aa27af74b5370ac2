//! Disposables and scoped disposal bags.
//!
//! A [`Disposable`] is anything that can be told to release itself. A
//! [`DisposablesBag`] collects disposables and disposes all of them when it is
//! dropped, tying a group of subscriptions to the lifetime of their owner.
//!
//! # Example
//!
//! ```
//! use piguard_observable::{Cell, Disposable, DisposablesBag};
//!
//! let temperature = Cell::new(None::<String>);
//! let bag = DisposablesBag::new();
//!
//! temperature
//!     .observe(|value| println!("temperature: {value:?}"))
//!     .add_to_disposables_bag(&bag);
//!
//! temperature.set(Some("21°C".into()));
//! drop(bag); // unsubscribes
//! assert_eq!(temperature.observer_count(), 0);
//! ```

use core::fmt;
use core::mem;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// Disposable Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Something that can be released exactly once.
///
/// Implementations must make [`dispose`](Disposable::dispose) idempotent.
pub trait Disposable: Send + Sync {
    /// Releases the resource. Calling this again is a no-op.
    fn dispose(&self);

    /// Returns `true` once [`dispose`](Disposable::dispose) has been called.
    fn is_disposed(&self) -> bool;

    /// Hands this disposable to `bag` for grouped disposal.
    ///
    /// Equivalent to `bag.add(self)`.
    fn add_to_disposables_bag(self, bag: &DisposablesBag)
    where
        Self: Sized + 'static,
    {
        bag.add(self);
    }
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AnyDisposable
// ─────────────────────────────────────────────────────────────────────────────

/// A disposable running a closure on first disposal.
pub struct AnyDisposable {
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    disposed: AtomicBool,
}

impl AnyDisposable {
    /// Creates a disposable that runs `action` the first time it is disposed.
    #[must_use]
    pub fn from_fn(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Mutex::new(Some(Box::new(action))),
            disposed: AtomicBool::new(false),
        }
    }
}

impl Disposable for AnyDisposable {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AnyDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyDisposable")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DisposablesBag
// ─────────────────────────────────────────────────────────────────────────────

/// Scoped collection of disposables.
///
/// Everything added is disposed, in insertion order, by
/// [`dispose_all`](Self::dispose_all) or when the bag is dropped.
#[derive(Default)]
pub struct DisposablesBag {
    disposables: Mutex<Vec<Box<dyn Disposable>>>,
}

impl DisposablesBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `disposable` to the bag.
    pub fn add(&self, disposable: impl Disposable + 'static) {
        self.disposables.lock().push(Box::new(disposable));
    }

    /// Disposes every held disposable in insertion order and empties the bag.
    ///
    /// Disposables added while this runs stay in the bag for the next call.
    pub fn dispose_all(&self) {
        let disposables = mem::take(&mut *self.disposables.lock());
        if disposables.is_empty() {
            return;
        }
        tracing::debug!(count = disposables.len(), "disposing bag");
        for disposable in &disposables {
            disposable.dispose();
        }
    }

    /// Returns the number of disposables currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.disposables.lock().len()
    }

    /// Returns `true` if the bag holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disposables.lock().is_empty()
    }
}

impl Drop for DisposablesBag {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl fmt::Debug for DisposablesBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposablesBag")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> AnyDisposable {
        let log = Arc::clone(log);
        AnyDisposable::from_fn(move || log.lock().push(name))
    }

    #[test]
    fn any_disposable_runs_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let disposable = recording(&log, "a");

        assert!(!disposable.is_disposed());
        disposable.dispose();
        disposable.dispose();

        assert!(disposable.is_disposed());
        assert_eq!(*log.lock(), ["a"]);
    }

    #[test]
    fn bag_disposes_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bag = DisposablesBag::new();
        recording(&log, "first").add_to_disposables_bag(&bag);
        recording(&log, "second").add_to_disposables_bag(&bag);
        bag.add(recording(&log, "third"));

        assert_eq!(bag.len(), 3);
        bag.dispose_all();

        assert!(bag.is_empty());
        assert_eq!(*log.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn dropping_bag_disposes_contents() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let bag = DisposablesBag::new();
            bag.add(recording(&log, "scoped"));
        }
        assert_eq!(*log.lock(), ["scoped"]);
    }

    #[test]
    fn manual_then_drop_disposes_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bag = DisposablesBag::new();
        bag.add(recording(&log, "once"));

        bag.dispose_all();
        drop(bag);

        assert_eq!(*log.lock(), ["once"]);
    }

    #[test]
    fn disposable_may_add_to_bag_while_disposing() {
        let bag = Arc::new(DisposablesBag::new());
        let inner = Arc::clone(&bag);
        bag.add(AnyDisposable::from_fn(move || {
            inner.add(AnyDisposable::from_fn(|| {}));
        }));

        bag.dispose_all();
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn boxed_disposable_delegates() {
        let boxed: Box<dyn Disposable> = Box::new(AnyDisposable::from_fn(|| {}));
        boxed.dispose();
        assert!(boxed.is_disposed());
    }
}
