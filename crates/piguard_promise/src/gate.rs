//! Serial execution gate shared by a promise chain.
//!
//! A [`Gate`] is a FIFO task queue drained by at most one worker at a time.
//! A running task may [`suspend`](Gate::suspend) the gate; no further task is
//! started until a matching [`resume`](Gate::resume). Promises use this to
//! hold back their continuations until the outcome has been stored.
//!
//! ```text
//!   enqueue ──▶ [ start(P) | then(a) | on_error(h) ] ──▶ drain worker
//!                   │
//!                   └─ suspends; resolving P resumes the queue
//! ```

use core::fmt;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

/// A unit of work scheduled on a gate.
pub(crate) type Task = Box<dyn FnOnce(&Gate) + Send + 'static>;

/// Identifier of a gate, used in tracing output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GateId(Arc<str>);

impl GateId {
    fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate_{}", self.0)
    }
}

#[derive(Default)]
struct GateState {
    tasks: VecDeque<Task>,
    /// Outstanding suspensions; tasks only start while this is zero.
    suspensions: usize,
    /// Whether a worker currently owns the queue.
    draining: bool,
}

impl GateState {
    /// Claims the queue for a new worker if it is runnable and unowned.
    fn claim(&mut self) -> bool {
        if self.draining || self.suspensions > 0 || self.tasks.is_empty() {
            return false;
        }
        self.draining = true;
        true
    }
}

struct GateInner {
    id: GateId,
    state: Mutex<GateState>,
}

/// Strictly serial execution context.
#[derive(Clone)]
pub(crate) struct Gate {
    inner: Arc<GateInner>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                id: GateId::new(),
                state: Mutex::new(GateState::default()),
            }),
        }
    }

    pub(crate) fn id(&self) -> &GateId {
        &self.inner.id
    }

    /// Appends a task; it runs after every task enqueued before it.
    pub(crate) fn enqueue(&self, task: Task) {
        let start = {
            let mut state = self.inner.state.lock();
            state.tasks.push_back(task);
            state.claim()
        };
        tracing::trace!(gate = %self.inner.id, start, "task enqueued");
        if start {
            self.spawn_worker();
        }
    }

    /// Holds back the queue once the current task returns.
    pub(crate) fn suspend(&self) {
        let mut state = self.inner.state.lock();
        state.suspensions += 1;
        tracing::trace!(gate = %self.inner.id, suspensions = state.suspensions, "gate suspended");
    }

    /// Releases one suspension, restarting the queue when none remain.
    pub(crate) fn resume(&self) {
        let start = {
            let mut state = self.inner.state.lock();
            let Some(remaining) = state.suspensions.checked_sub(1) else {
                tracing::error!(gate = %self.inner.id, "resume without matching suspend");
                return;
            };
            state.suspensions = remaining;
            state.claim()
        };
        tracing::trace!(gate = %self.inner.id, start, "gate resumed");
        if start {
            self.spawn_worker();
        }
    }

    fn spawn_worker(&self) {
        let gate = self.clone();
        let spawned = thread::Builder::new()
            .name(format!("piguard-{}", self.inner.id))
            .spawn(move || gate.drain());

        if let Err(err) = spawned {
            tracing::warn!(gate = %self.inner.id, error = %err, "worker spawn failed, draining inline");
            self.drain();
        }
    }

    /// Runs queued tasks until the queue is empty or suspended.
    fn drain(&self) {
        loop {
            let task = {
                let mut state = self.inner.state.lock();
                if state.suspensions > 0 {
                    state.draining = false;
                    return;
                }
                match state.tasks.pop_front() {
                    Some(task) => task,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task(self))) {
                tracing::error!(
                    gate = %self.inner.id,
                    panic = panic_message(payload.as_ref()),
                    "task panicked on gate"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
