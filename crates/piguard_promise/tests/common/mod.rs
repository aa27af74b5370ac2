//! Shared helpers for promise integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use core::time::Duration;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use piguard_promise::{BoxError, Promise};

/// Upper bound for any blocking wait in tests.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A promise that succeeds with `value` from another thread after `delay`.
pub fn delayed<T: Send + Sync + 'static>(value: T, delay: Duration) -> Promise<T> {
    Promise::new(move |resolver| {
        thread::spawn(move || {
            thread::sleep(delay);
            resolver.succeed(value);
        });
    })
}

/// A promise that fails with `error` from another thread after `delay`.
pub fn delayed_failure<T: Send + Sync + 'static>(
    error: impl Into<BoxError> + Send + 'static,
    delay: Duration,
) -> Promise<T> {
    Promise::new(move |resolver| {
        thread::spawn(move || {
            thread::sleep(delay);
            resolver.fail(error);
        });
    })
}

/// Thread-safe, cloneable event log.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// Sensor error used across tests.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("sensor {0} offline")]
pub struct SensorOffline(pub &'static str);
