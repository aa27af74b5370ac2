//! Single-assignment promises for PiGuard.
//!
//! `piguard_promise` provides a [`Promise`] that resolves exactly once to an
//! [`Outcome`], with chainable continuations that run on a serial execution
//! gate shared by the whole chain.
//!
//! # Core Concepts
//!
//! - [`Promise`] - Handle to a computation resolving once
//! - [`Resolver`] - The `succeed`/`fail` pair handed to a start routine
//! - [`Outcome`] - `Success(T)` or `Failure(Error)`
//! - [`Error`] - Cloneable failure carrying an [`ErrorKind`]
//!
//! # Ordering
//!
//! Every promise derived with [`Promise::then`], [`Promise::try_then`],
//! [`Promise::and_then`] or [`Promise::wait`] shares its parent's gate.
//! Tasks on a gate never overlap, and a continuation never starts before the
//! promise it reads from is resolved. Independent chains run in parallel.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use piguard_promise::Promise;
//!
//! let reading = Promise::new(|resolver| {
//!     std::thread::spawn(move || resolver.succeed("21.5"));
//! })
//! .try_then(|raw| raw.parse::<f64>())
//! .wait(Duration::from_millis(10))
//! .on_error(|error| eprintln!("reading failed: {error}"));
//!
//! assert_eq!(reading.join().unwrap(), 21.5);
//! ```
//!
//! # Limitations
//!
//! A started computation always runs to completion; there is no
//! cancellation. [`Promise::wait`] is a plain delay that holds the gate.

mod error;
mod gate;
mod outcome;
mod promise;

pub use error::{BoxError, Error, ErrorKind};
pub use gate::GateId;
pub use outcome::Outcome;
pub use promise::{Promise, PromiseFuture, Resolver};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::{Error, ErrorKind};
    pub use crate::outcome::Outcome;
    pub use crate::promise::{Promise, Resolver};
}
