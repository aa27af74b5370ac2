//! Station summary CLI.
//!
//! Loads the summary of a simulated station, toggles it on, takes a
//! snapshot and logs the rendered labels.
//!
//! # Usage
//!
//! ```bash
//! PIGUARD_SITE=pi.local PIGUARD_USERNAME=admin PIGUARD_PASSWORD=secret piguard-summary
//! ```

use std::time::Duration;

use piguard_core::TracingSetup;
use summary::{
    Credentials, Settings, SimulatedStation, Station, SummaryView, SummaryViewModel,
    run_refresh_cycle,
};

fn main() {
    let _ = dotenvy::dotenv();
    TracingSetup::new().install();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid settings");
        std::process::exit(1);
    });
    let settings = if settings.settings_loaded() {
        settings
    } else {
        tracing::warn!("station settings missing, using demo station");
        Settings::new()
            .with_site("piguard.local")
            .with_credentials(Credentials::new("demo", "demo"))
    };

    let station = Station::new(SimulatedStation::new(settings.clone()));
    let model = SummaryViewModel::new(station, settings)
        .with_snapshot_delay(Duration::from_millis(200));
    let view = SummaryView::attach(&model);

    if let Err(e) = model.load_status().join() {
        tracing::error!(error = %e, "cannot reach station");
        std::process::exit(1);
    }
    let failures = run_refresh_cycle(&model);
    if !failures.is_empty() {
        tracing::warn!(failed = failures.len(), "refresh cycle incomplete");
    }

    if model.streaming_url().is_some() {
        tracing::info!("live video available");
    }
    for (label, text) in view.labels() {
        tracing::info!(label, %text);
    }
}
