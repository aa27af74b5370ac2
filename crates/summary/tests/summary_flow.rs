//! End-to-end tests of the summary screen against a simulated station.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use piguard_observable::{Disposable, DisposablesBag};
use piguard_promise::ErrorKind;
use summary::{
    Credentials, Settings, SimulatedStation, Station, StationError, SummaryView, SummaryViewModel,
};

fn settings() -> Settings {
    Settings::new()
        .with_site("pi.local")
        .with_credentials(Credentials::new("admin", "pw"))
}

fn setup() -> (SimulatedStation, SummaryViewModel) {
    let simulated = SimulatedStation::new(settings()).with_latency(Duration::from_millis(5));
    let model = SummaryViewModel::new(Station::new(simulated.clone()), settings())
        .with_snapshot_delay(Duration::from_millis(10));
    (simulated, model)
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADING
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that loading readings fills every sensor label from the newest reading.
#[test]
fn load_data_renders_latest_reading() {
    let (_, model) = setup();
    let view = SummaryView::attach(&model);

    let statuses = model.load_data().join().unwrap();

    assert_eq!(statuses.len(), 6);
    assert_eq!(view.label("date").as_deref(), Some("21 Oct"));
    assert_eq!(view.label("time").as_deref(), Some("14:05"));
    assert_eq!(view.label("temperature").as_deref(), Some("21°C"));
    assert_eq!(view.label("humidity").as_deref(), Some("48%"));
    assert_eq!(view.label("pressure").as_deref(), Some("1013.2mbar"));
    assert_eq!(view.label("co2").as_deref(), Some("415ppm"));
    assert_eq!(
        view.label("picture").as_deref(),
        Some("https://admin:pw@pi.local:2728/image/picture_0.jpg")
    );
}

/// Verifies that histories run oldest first and motion lists only detections.
#[test]
fn load_data_builds_histories() {
    let (_, model) = setup();
    model.load_data().join().unwrap();

    let temperatures = model.temperature_history.get();
    assert_eq!(temperatures.len(), 6);
    assert_eq!(temperatures[0], (18.5, "09:05".to_owned()));
    assert_eq!(temperatures[5], (21.0, "14:05".to_owned()));

    let motion: Vec<String> = model
        .motion_history
        .get()
        .into_iter()
        .map(|(_, picture)| picture)
        .collect();
    assert_eq!(motion, ["picture_1.jpg", "picture_3.jpg"]);
}

/// Verifies the labels recorded by a view across placeholder and loaded state.
#[test]
fn temperature_label_sequence() {
    let (_, model) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let bag = DisposablesBag::new();
    model
        .temperature
        .bind(move |value| sink.lock().push(value.clone()))
        .add_to_disposables_bag(&bag);

    model.load_data().join().unwrap();
    drop(bag);
    model.temperature.set(Some("99°C".into()));

    assert_eq!(*seen.lock(), [None, Some("21°C".to_owned())]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that start/stop flips the system switch each time.
#[test]
fn start_and_stop_toggles_system() {
    let (_, model) = setup();
    model.load_status().join().unwrap();
    assert!(!model.system_on.get());

    model.start_and_stop().join().unwrap();
    assert!(model.system_on.get());

    model.start_and_stop().join().unwrap();
    assert!(!model.system_on.get());
}

/// Verifies that the surveillance toggle switches modes.
#[test]
fn toggle_surveillance_switches_mode() {
    let (_, model) = setup();
    let view = SummaryView::attach(&model);

    model.toggle_surveillance().join().unwrap();
    assert_eq!(view.label("surveillance").as_deref(), Some("on"));

    model.toggle_surveillance().join().unwrap();
    assert_eq!(view.label("surveillance").as_deref(), Some("off"));
}

/// Verifies that a snapshot waits, then reloads with the new picture on top.
#[test]
fn snapshot_reloads_after_delay() {
    let (simulated, model) = setup();
    let view = SummaryView::attach(&model);

    let started = Instant::now();
    let statuses = model.take_snapshot().join().unwrap();

    assert!(started.elapsed() >= Duration::from_millis(10));
    assert_eq!(simulated.snapshot_count(), 1);
    assert_eq!(statuses[0].picture_name, "snapshot_1.jpg");
    assert_eq!(view.label("time").as_deref(), Some("14:06"));
    assert!(
        view.label("picture")
            .is_some_and(|url| url.ends_with("/image/snapshot_1.jpg"))
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that missing settings fail every request and surface the error.
#[test]
fn missing_settings_surface_error() {
    let model = SummaryViewModel::new(
        Station::new(SimulatedStation::new(Settings::new())),
        Settings::new(),
    );
    let view = SummaryView::attach(&model);

    let error = model.load_status().join().unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Rejected);
    assert_eq!(
        error.downcast_ref::<StationError>(),
        Some(&StationError::SettingsMissing)
    );
    assert_eq!(
        view.label("error").as_deref(),
        Some("rejected: station settings missing")
    );
    assert!(!model.system_on.get());
}

/// Verifies that a failed snapshot skips the reload.
#[test]
fn failed_snapshot_skips_reload() {
    let model = SummaryViewModel::new(
        Station::new(SimulatedStation::new(Settings::new())),
        Settings::new(),
    )
    .with_snapshot_delay(Duration::ZERO);

    let error = model.take_snapshot().join().unwrap_err();

    assert_eq!(
        error.downcast_ref::<StationError>(),
        Some(&StationError::SettingsMissing)
    );
    assert_eq!(model.date.get(), "01 Jan");
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASYNC
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that view model operations can be awaited concurrently.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operations_await_concurrently() {
    let (_, model) = setup();
    let view = SummaryView::attach(&model);

    let (statuses, status) = tokio::join!(
        model.load_data().into_future(),
        model.load_status().into_future()
    );

    assert_eq!(statuses.unwrap().len(), 6);
    assert!(status.is_ok());
    assert_eq!(view.label("co2").as_deref(), Some("415ppm"));
    assert_eq!(view.label("system").as_deref(), Some("off"));
}
