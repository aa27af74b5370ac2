//! Observable cells and scoped disposal for PiGuard.
//!
//! `piguard_observable` provides a [`Cell`] that holds one current value and
//! notifies observers synchronously on every mutation, plus the disposal
//! machinery that lets observers unsubscribe safely at any time, including
//! from inside their own callback.
//!
//! # Core Concepts
//!
//! - [`Cell`] - Single-slot observable value
//! - [`Observation`] - Subscription handle returned by [`Cell::observe`]
//! - [`Disposable`] - Anything that can be released once
//! - [`DisposablesBag`] - Scoped group of disposables released together
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use piguard_observable::{Cell, Disposable, DisposablesBag};
//!
//! struct TemperatureLabel {
//!     text: Arc<Mutex<String>>,
//!     bag: DisposablesBag,
//! }
//!
//! let temperature = Cell::new(None::<String>);
//! let label = TemperatureLabel {
//!     text: Arc::new(Mutex::new(String::new())),
//!     bag: DisposablesBag::new(),
//! };
//!
//! let text = Arc::clone(&label.text);
//! temperature
//!     .bind(move |value| *text.lock().unwrap() = value.clone().unwrap_or_default())
//!     .add_to_disposables_bag(&label.bag);
//!
//! temperature.set(Some("21°C".into()));
//! assert_eq!(*label.text.lock().unwrap(), "21°C");
//!
//! drop(label);
//! assert_eq!(temperature.observer_count(), 0);
//! ```

mod cell;
mod disposable;

pub use cell::{Cell, Observable, Observation, ObservationId};
pub use disposable::{AnyDisposable, Disposable, DisposablesBag};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::cell::{Cell, Observable, Observation};
    pub use crate::disposable::{AnyDisposable, Disposable, DisposablesBag};
}
