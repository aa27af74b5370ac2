//! Tracing subscriber setup.
//!
//! Provides [`TracingSetup`], a builder that installs the global `tracing`
//! subscriber, and [`TracingConfig`], the settings it was installed with.
//!
//! The promise and cell crates only emit events; installing a subscriber is
//! up to the application. A second install is a no-op, so tests and binaries
//! may both call [`TracingSetup::install`].
//!
//! # Example
//!
//! ```
//! use piguard_core::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! // Development: pretty output with span events
//! let dev = TracingSetup::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Pretty)
//!     .with_span_events(true);
//!
//! // Production: JSON output, quiet gates
//! let prod = TracingSetup::default()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("summary=info,piguard_promise=warn");
//! # let _ = (dev, prod);
//! ```

use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable consulted for a filter when none is set explicitly.
pub const LOG_ENV_VAR: &str = "PIGUARD_LOG";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration a [`TracingSetup`] was installed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
    /// The filter directives in effect.
    pub filter: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the global tracing subscriber.
///
/// Filter precedence: [`with_env_filter`](Self::with_env_filter), then the
/// [`LOG_ENV_VAR`] environment variable, then the plain level.
#[derive(Debug, Clone)]
pub struct TracingSetup {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "summary=debug,piguard_promise=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a new `TracingSetup` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Resolves the filter directives this setup would install.
    fn filter_directives(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var(LOG_ENV_VAR).ok())
            .filter(|directives| EnvFilter::try_new(directives).is_ok())
            .unwrap_or_else(|| self.level.as_str().to_owned())
    }

    /// Returns the configuration [`install`](Self::install) would apply.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
            filter: self.filter_directives(),
        }
    }

    /// Builds the `fmt` layer for the configured format.
    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(span_events);
        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the global subscriber and returns the applied configuration.
    ///
    /// Does nothing if a global subscriber is already installed.
    pub fn install(&self) -> TracingConfig {
        let config = self.config();
        let installed = tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(EnvFilter::new(&config.filter))
            .try_init()
            .is_ok();

        tracing::debug!(
            installed,
            level = %config.level,
            format = ?config.format,
            filter = %config.filter,
            "tracing configured"
        );
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_setup_default_level_is_info() {
        let setup = TracingSetup::default();
        assert_eq!(setup.level, Level::INFO);
    }

    #[test]
    fn tracing_setup_with_level() {
        let setup = TracingSetup::new().with_level(Level::DEBUG);
        assert_eq!(setup.level, Level::DEBUG);
    }

    #[test]
    fn tracing_setup_with_format() {
        let setup = TracingSetup::new().with_format(TracingFormat::Json);
        assert_eq!(setup.format, TracingFormat::Json);
    }

    #[test]
    fn tracing_setup_with_span_events() {
        let setup = TracingSetup::new().with_span_events(true);
        assert!(setup.span_events);
    }

    #[test]
    fn explicit_filter_is_used() {
        let config = TracingSetup::new()
            .with_env_filter("summary=debug")
            .config();
        assert_eq!(config.filter, "summary=debug");
    }

    #[test]
    fn invalid_filter_falls_back_to_level() {
        let config = TracingSetup::new()
            .with_level(Level::WARN)
            .with_env_filter("summary=loud")
            .config();
        assert_eq!(config.filter, "WARN");
    }

    #[test]
    fn fmt_layer_builds_for_every_format() {
        for format in [TracingFormat::Pretty, TracingFormat::Compact, TracingFormat::Json] {
            let _layer = TracingSetup::new()
                .with_format(format)
                .with_span_events(true)
                .fmt_layer();
        }
    }

    #[test]
    fn install_twice_is_harmless() {
        let setup = TracingSetup::new()
            .with_format(TracingFormat::Compact)
            .with_env_filter("piguard=trace");
        let first = setup.install();
        let second = setup.install();
        assert_eq!(first, second);
    }
}
