//! Observable single-value cells.
//!
//! A [`Cell`] holds one current value and synchronously notifies its
//! observers on every mutation, in registration order.
//!
//! # Notification passes
//!
//! Each mutation runs one notification pass:
//!
//! 1. Removals requested by disposed [`Observation`]s are applied.
//! 2. The observer list is snapshotted.
//! 3. Every observer in the snapshot is called with the new value.
//!
//! Observers registered during a pass are not part of its snapshot, and a
//! disposal requested during a pass only takes effect from the next one.
//!
//! At most one thread delivers a cell's passes at a time, and no lock is held
//! while observers run. A mutation that finds a pass in progress, whether from
//! one of the cell's own callbacks or from another thread, stores its value
//! immediately and queues its pass; the thread already delivering runs it
//! once the current pass finishes.

use core::fmt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hashbrown::HashSet;
use parking_lot::Mutex;

use crate::disposable::Disposable;

// ─────────────────────────────────────────────────────────────────────────────
// ObservationId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier of an [`Observation`].
///
/// Internally uses `Arc<str>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationId(Arc<str>);

impl ObservationId {
    fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observation_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cell internals
// ─────────────────────────────────────────────────────────────────────────────

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registration<T> {
    id: ObservationId,
    observer: Observer<T>,
}

impl<T> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            observer: Arc::clone(&self.observer),
        }
    }
}

struct State<T> {
    value: T,
    registrations: Vec<Registration<T>>,
    pending_removals: HashSet<ObservationId>,
    /// Whether some thread is currently delivering passes.
    notifying: bool,
    /// Values whose passes have not been delivered yet, oldest first.
    queued: VecDeque<T>,
}

impl<T> State<T> {
    fn flush_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let removals = &self.pending_removals;
        self.registrations.retain(|r| !removals.contains(&r.id));
        self.pending_removals.clear();
    }

    /// Queues a pass for `value`; returns `true` if the caller must deliver it.
    fn enqueue(&mut self, value: T) -> bool {
        self.queued.push_back(value);
        !std::mem::replace(&mut self.notifying, true)
    }
}

struct Inner<T> {
    state: Mutex<State<T>>,
}

impl<T> Inner<T> {
    fn schedule_removal(&self, id: ObservationId) {
        tracing::debug!(observation = %id, "observation removal scheduled");
        self.state.lock().pending_removals.insert(id);
    }
}

/// Releases delivery if an observer panics, dropping the passes still queued.
struct PassGuard<'a, T> {
    inner: &'a Inner<T>,
}

impl<T> Drop for PassGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.notifying = false;
        if !state.queued.is_empty() {
            tracing::warn!(
                dropped = state.queued.len(),
                "observer panicked, discarding queued notifications"
            );
            state.queued.clear();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cell
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable single-slot value holder that notifies observers on every change.
///
/// `Cell` is a cheap-to-clone handle; clones share the same slot and
/// observers. Readers only ever receive copies of the value.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use piguard_observable::{Cell, Disposable};
///
/// let humidity = Cell::new(40);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&seen);
/// let observation = humidity.observe(move |v| sink.lock().unwrap().push(*v));
///
/// humidity.set(41);
/// observation.dispose();
/// humidity.set(42);
///
/// assert_eq!(*seen.lock().unwrap(), [41]);
/// assert_eq!(humidity.get(), 42);
/// ```
pub struct Cell<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Cell<T> {
    /// Creates a cell holding `value`, with no observers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    value,
                    registrations: Vec::new(),
                    pending_removals: HashSet::new(),
                    notifying: false,
                    queued: VecDeque::new(),
                }),
            }),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.state.lock().value.clone()
    }

    /// Calls `f` with a reference to the current value.
    ///
    /// `f` must not access this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.state.lock().value)
    }

    /// Replaces the value and notifies every registered observer.
    ///
    /// If a pass is already being delivered, the value is stored now and its
    /// pass runs on the delivering thread after the current one.
    pub fn set(&self, value: T) {
        let deliver = {
            let mut state = self.inner.state.lock();
            state.value = value.clone();
            state.enqueue(value)
        };
        if deliver {
            self.deliver();
        }
    }

    /// Mutates the value in place, then notifies like [`set`](Self::set).
    ///
    /// `f` must not access this cell.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let deliver = {
            let mut state = self.inner.state.lock();
            f(&mut state.value);
            let value = state.value.clone();
            state.enqueue(value)
        };
        if deliver {
            self.deliver();
        }
    }

    /// Registers `observer`, called with each new value after this point.
    ///
    /// The returned [`Observation`] unregisters the observer when disposed.
    /// Dropping it without disposing leaves the observer registered.
    #[must_use = "dropping the observation keeps the observer registered forever"]
    pub fn observe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Observation<T> {
        let mut state = self.inner.state.lock();
        self.register(&mut state, Arc::new(observer))
    }

    /// Calls `observer` with the current value, then keeps it registered.
    ///
    /// When no pass is in progress, later mutations are delivered only after
    /// this initial call.
    #[must_use = "dropping the observation keeps the observer registered forever"]
    pub fn bind(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Observation<T> {
        let observer: Observer<T> = Arc::new(observer);
        let (observation, value, deliver) = {
            let mut state = self.inner.state.lock();
            let observation = self.register(&mut state, Arc::clone(&observer));
            let deliver = !std::mem::replace(&mut state.notifying, true);
            (observation, state.value.clone(), deliver)
        };
        if deliver {
            let guard = PassGuard { inner: &self.inner };
            observer(&value);
            self.drain(guard);
        } else {
            observer(&value);
        }
        observation
    }

    fn register(&self, state: &mut State<T>, observer: Observer<T>) -> Observation<T> {
        let id = ObservationId::new();
        state.flush_removals();
        state.registrations.push(Registration {
            id: id.clone(),
            observer,
        });
        tracing::trace!(observation = %id, "observer registered");
        Observation {
            id,
            cell: Arc::downgrade(&self.inner),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the number of observers that have not been disposed.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        let state = self.inner.state.lock();
        state
            .registrations
            .iter()
            .filter(|r| !state.pending_removals.contains(&r.id))
            .count()
    }

    /// Delivers queued passes until none remain. Only one thread at a time.
    fn deliver(&self) {
        self.drain(PassGuard { inner: &self.inner });
    }

    fn drain(&self, guard: PassGuard<'_, T>) {
        loop {
            let (value, snapshot) = {
                let mut state = self.inner.state.lock();
                let Some(value) = state.queued.pop_front() else {
                    state.notifying = false;
                    break;
                };
                state.flush_removals();
                (value, state.registrations.clone())
            };
            tracing::trace!(observers = snapshot.len(), "notification pass");
            for registration in &snapshot {
                (registration.observer)(&value);
            }
        }
        // Delivery was released above; another thread may already own it.
        core::mem::forget(guard);
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Cell")
            .field("value", &state.value)
            .field("observers", &state.registrations.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observation
// ─────────────────────────────────────────────────────────────────────────────

/// Subscription handle returned by [`Cell::observe`].
///
/// Holds only a weak reference to its cell. Disposing schedules removal of
/// the observer before the cell's next notification pass; if the cell no
/// longer exists, disposing does nothing. Two observations are equal only if
/// they are handles to the same registration.
pub struct Observation<T> {
    id: ObservationId,
    cell: Weak<Inner<T>>,
    disposed: Arc<AtomicBool>,
}

impl<T> Observation<T> {
    /// Returns the identifier of this observation.
    #[must_use]
    pub fn id(&self) -> &ObservationId {
        &self.id
    }
}

impl<T> Clone for Observation<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            cell: Weak::clone(&self.cell),
            disposed: Arc::clone(&self.disposed),
        }
    }
}

impl<T> PartialEq for Observation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Observation<T> {}

impl<T> fmt::Debug for Observation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("id", &self.id)
            .field("disposed", &self.disposed.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: Send + Sync> Disposable for Observation<T> {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(cell) = self.cell.upgrade() {
            cell.schedule_removal(self.id.clone());
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observable Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A value container that can be read, written and observed.
pub trait Observable {
    /// Type of the observed value.
    type Value;

    /// Returns a copy of the current value.
    fn get(&self) -> Self::Value;

    /// Replaces the value and notifies observers.
    fn set(&self, value: Self::Value);

    /// Registers an observer and returns its disposal handle.
    fn observe(
        &self,
        observer: Box<dyn Fn(&Self::Value) + Send + Sync>,
    ) -> Box<dyn Disposable>;
}

impl<T: Clone + Send + Sync + 'static> Observable for Cell<T> {
    type Value = T;

    fn get(&self) -> T {
        Cell::get(self)
    }

    fn set(&self, value: T) {
        Cell::set(self, value);
    }

    fn observe(&self, observer: Box<dyn Fn(&T) + Send + Sync>) -> Box<dyn Disposable> {
        Box::new(Cell::observe(self, observer))
    }
}
