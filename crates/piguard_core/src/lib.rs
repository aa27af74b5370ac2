//! Core infrastructure for PiGuard.
//!
//! This crate provides the ambient pieces most PiGuard applications need:
//!
//! - [`TracingSetup`] - Logging and observability via the `tracing` crate
//! - [`TracingConfig`] - The configuration a setup was installed with
//!
//! # Example
//!
//! ```no_run
//! use piguard_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! let config = TracingSetup::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .install();
//!
//! tracing::info!(level = %config.level, "logging ready");
//! ```

mod tracing_setup;

pub use tracing_setup::{LOG_ENV_VAR, TracingConfig, TracingFormat, TracingSetup};
