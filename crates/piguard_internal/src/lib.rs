//! # PiGuard Internal Library
//!
//! Re-exports the core PiGuard crates for convenience.

/// Single-assignment promises with chainable continuations.
pub use piguard_promise;

/// Observable cells and scoped disposal.
pub use piguard_observable;

/// Ambient infrastructure (tracing setup).
pub use piguard_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use piguard_core::{TracingConfig, TracingFormat, TracingSetup};
    pub use piguard_observable::prelude::*;
    pub use piguard_promise::prelude::*;
}
