//! Single-assignment promises.
//!
//! A [`Promise`] is created in the pending state from a start routine that
//! receives a [`Resolver`]. The start routine runs asynchronously on the
//! promise's gate, a strictly serial task queue. The gate stays suspended
//! until the promise is resolved, so continuations attached with
//! [`Promise::then`] and friends run strictly after resolution and in the
//! order they were attached.
//!
//! # Example
//!
//! ```
//! use piguard_promise::Promise;
//!
//! let answer = Promise::new(|resolver| {
//!     std::thread::spawn(move || resolver.succeed(42));
//! })
//! .then(|x| x + 1)
//! .then(|x| x * 2);
//!
//! assert_eq!(answer.join().unwrap(), 86);
//! ```
//!
//! # Unhandled failures
//!
//! A failure that no [`Promise::on_error`] tap (or awaiting caller) looks at is
//! simply never observed. Fire-and-forget chains are allowed.

use core::future::{Future, IntoFuture};
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use std::sync::{Arc, OnceLock};
use std::thread;

use futures::channel::oneshot;

use crate::error::{BoxError, Error};
use crate::gate::{Gate, GateId};
use crate::outcome::Outcome;

// ─────────────────────────────────────────────────────────────────────────────
// Shared slot
// ─────────────────────────────────────────────────────────────────────────────

struct Shared<T> {
    outcome: OnceLock<Outcome<T>>,
    gate: Gate,
}

impl<T> Shared<T> {
    /// Stores `outcome` unless one is already stored, then lifts the gate.
    fn resolve(&self, outcome: Outcome<T>) -> bool {
        let success = outcome.is_success();
        if self.outcome.set(outcome).is_err() {
            tracing::warn!(gate = %self.gate.id(), "ignoring second resolution of promise");
            return false;
        }
        tracing::debug!(gate = %self.gate.id(), success, "promise resolved");
        self.gate.resume();
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

struct ResolverGuard<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for ResolverGuard<T> {
    fn drop(&mut self) {
        if self.shared.outcome.get().is_none() {
            tracing::warn!(gate = %self.shared.gate.id(), "promise abandoned by its resolvers");
            self.shared.resolve(Outcome::Failure(Error::abandoned()));
        }
    }
}

/// Completion handle passed to a promise's start routine.
///
/// This is the `(succeed, fail)` callback pair as one value. It can be cloned
/// and sent to other threads. Only the first resolution is accepted; later
/// calls are ignored and return `false`.
///
/// If the last clone is dropped before the promise was resolved, the promise
/// fails with [`ErrorKind::Abandoned`](crate::ErrorKind::Abandoned).
pub struct Resolver<T> {
    guard: Arc<ResolverGuard<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<T> Resolver<T> {
    fn new(shared: Arc<Shared<T>>) -> Self {
        Self {
            guard: Arc::new(ResolverGuard { shared }),
        }
    }

    /// Resolves the promise with a success value.
    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Outcome::Success(value))
    }

    /// Resolves the promise with a [`ErrorKind::Rejected`](crate::ErrorKind::Rejected)
    /// failure wrapping `error`.
    ///
    /// An [`Error`] is stored unchanged.
    pub fn fail(&self, error: impl Into<BoxError>) -> bool {
        self.resolve(Outcome::Failure(Error::rejected(error)))
    }

    /// Resolves the promise with an existing [`Error`].
    pub fn reject(&self, error: Error) -> bool {
        self.resolve(Outcome::Failure(error))
    }

    /// Resolves the promise with `outcome`.
    ///
    /// Returns `false` if the promise was already resolved.
    pub fn resolve(&self, outcome: Outcome<T>) -> bool {
        self.guard.shared.resolve(outcome)
    }

    /// Returns `true` once the promise has an outcome.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.guard.shared.outcome.get().is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Promise
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a computation that resolves exactly once.
///
/// Cloning the handle is cheap; clones observe the same outcome.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> core::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Promise")
            .field("gate", self.shared.gate.id())
            .field("resolved", &self.shared.outcome.get().is_some())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Promise<T> {
    /// Creates a pending promise and schedules `start` on a new gate.
    ///
    /// `start` runs on a worker thread, exactly once. The promise resolves
    /// when the [`Resolver`] is first used.
    pub fn new<F>(start: F) -> Self
    where
        F: FnOnce(Resolver<T>) + Send + 'static,
    {
        Self::on_gate(Gate::new(), start)
    }

    /// Creates a promise from a fallible start routine.
    ///
    /// An `Err` returned by `start` fails the promise, unless the routine
    /// already resolved it.
    pub fn try_new<F, E>(start: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::new(move |resolver: Resolver<T>| {
            if let Err(error) = start(resolver.clone()) {
                resolver.fail(error);
            }
        })
    }

    /// Creates a promise that resolves with `value`.
    pub fn resolved(value: T) -> Self {
        Self::new(move |resolver| {
            resolver.succeed(value);
        })
    }

    /// Creates a promise that fails with `error`.
    pub fn rejected(error: Error) -> Self {
        Self::new(move |resolver| {
            resolver.reject(error);
        })
    }

    /// Schedules `start` on `gate`, suspending it until resolution.
    fn on_gate<F>(gate: Gate, start: F) -> Self
    where
        F: FnOnce(Resolver<T>) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            outcome: OnceLock::new(),
            gate: gate.clone(),
        });
        let slot = Arc::clone(&shared);
        gate.enqueue(Box::new(move |gate: &Gate| {
            gate.suspend();
            start(Resolver::new(slot));
        }));
        Self { shared }
    }

    /// Schedules `f` on this promise's gate with access to its outcome.
    fn continue_with<F>(&self, f: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.shared.gate.enqueue(Box::new(move |_: &Gate| {
            let Some(outcome) = shared.outcome.get() else {
                tracing::error!(gate = %shared.gate.id(), "continuation ran before resolution");
                return;
            };
            f(outcome);
        }));
    }

    /// Derives a promise on the same gate from this promise's outcome.
    fn derive<U, F>(&self, f: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&Outcome<T>, Resolver<U>) + Send + 'static,
    {
        let parent = Arc::clone(&self.shared);
        Promise::on_gate(self.shared.gate.clone(), move |resolver: Resolver<U>| {
            let Some(outcome) = parent.outcome.get() else {
                tracing::error!(gate = %parent.gate.id(), "derived promise started before its parent resolved");
                return;
            };
            f(outcome, resolver);
        })
    }

    /// Returns a promise resolving with `transform` applied to the success value.
    ///
    /// A failure is passed through without calling `transform`.
    pub fn then<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> U + Send + 'static,
    {
        self.derive(move |outcome, resolver| match outcome {
            Outcome::Success(value) => {
                resolver.succeed(transform(value));
            }
            Outcome::Failure(error) => {
                resolver.reject(error.clone());
            }
        })
    }

    /// Like [`then`](Self::then), with a fallible transform.
    ///
    /// An `Err` from `transform` fails the derived promise with
    /// [`ErrorKind::Transform`](crate::ErrorKind::Transform).
    pub fn try_then<U, E, F>(&self, transform: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce(&T) -> Result<U, E> + Send + 'static,
    {
        self.derive(move |outcome, resolver| match outcome {
            Outcome::Success(value) => match transform(value) {
                Ok(mapped) => {
                    resolver.succeed(mapped);
                }
                Err(error) => {
                    resolver.reject(Error::transform(error));
                }
            },
            Outcome::Failure(error) => {
                resolver.reject(error.clone());
            }
        })
    }

    /// Sequences a dependent asynchronous step.
    ///
    /// On success, `step` receives the value and a resolver for the derived
    /// promise, which it may complete later from any thread. The gate stays
    /// held until it does.
    pub fn and_then<U, F>(&self, step: F) -> Promise<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T, Resolver<U>) + Send + 'static,
    {
        self.derive(move |outcome, resolver| match outcome {
            Outcome::Success(value) => step(value, resolver),
            Outcome::Failure(error) => {
                resolver.reject(error.clone());
            }
        })
    }

    /// Runs `effect` on success and returns this same promise.
    pub fn on_success<F>(&self, effect: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.continue_with(move |outcome| {
            if let Outcome::Success(value) = outcome {
                effect(value);
            }
        });
        self.clone()
    }

    /// Runs `handler` on failure and returns this same promise.
    pub fn on_error<F>(&self, handler: F) -> Self
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        self.continue_with(move |outcome| {
            if let Outcome::Failure(error) = outcome {
                handler(error);
            }
        });
        self.clone()
    }

    /// Returns `true` once the promise has an outcome.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    /// Returns the outcome without waiting, if resolved.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome<T>> {
        self.shared.outcome.get()
    }

    /// Returns the identifier of the gate this promise runs on.
    ///
    /// Promises derived from one another share a gate.
    #[must_use]
    pub fn gate_id(&self) -> &GateId {
        self.shared.gate.id()
    }
}

impl<T: Clone + Send + Sync + 'static> Promise<T> {
    /// Returns a promise resolving with the same outcome after holding the
    /// gate for `delay`.
    ///
    /// Continuations attached later on the chain are delayed as well. The
    /// delay is not cancellable.
    pub fn wait(&self, delay: Duration) -> Promise<T> {
        self.derive(move |outcome, resolver| {
            thread::sleep(delay);
            resolver.resolve(outcome.clone());
        })
    }

    /// Blocks the calling thread until the promise resolves.
    ///
    /// Must not be called from a continuation running on the same chain, as
    /// the gate would wait on itself.
    pub fn join(&self) -> Result<T, Error> {
        futures::executor::block_on(self.clone().into_future())
    }
}

impl<T: Clone + Send + Sync + 'static> IntoFuture for Promise<T> {
    type Output = Result<T, Error>;
    type IntoFuture = PromiseFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        let (tx, rx) = oneshot::channel();
        self.continue_with(move |outcome| {
            let _ = tx.send(outcome.clone().into_result());
        });
        PromiseFuture { rx }
    }
}

/// Future returned by awaiting a [`Promise`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct PromiseFuture<T> {
    rx: oneshot::Receiver<Result<T, Error>>,
}

impl<T> Future for PromiseFuture<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(Error::abandoned())),
            Poll::Pending => Poll::Pending,
        }
    }
}
