//! The refresh cycle driven by the `piguard-summary` binary.

use piguard_promise::Error;

use crate::view_model::SummaryViewModel;

/// Loads the readings, toggles the station and takes a snapshot.
///
/// Every step runs even if an earlier one failed. Failures are logged at
/// `warn` and returned with the name of the step.
pub fn run_refresh_cycle(model: &SummaryViewModel) -> Vec<(&'static str, Error)> {
    let steps = [
        ("load_data", model.load_data().join().err()),
        ("start_and_stop", model.start_and_stop().join().err()),
        ("take_snapshot", model.take_snapshot().join().err()),
    ];

    steps
        .into_iter()
        .filter_map(|(step, error)| {
            let error = error?;
            tracing::warn!(step, %error, "refresh step failed");
            Some((step, error))
        })
        .collect()
}
