//! Station client and an in-process simulated station.
//!
//! [`Station`] turns raw JSON responses from a [`Transport`] into typed
//! promises. [`SimulatedStation`] is a [`Transport`] that answers on a
//! background thread after a configurable latency, the same way a network
//! round trip would.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use parking_lot::Mutex;
use piguard_promise::{BoxError, Promise};
use serde_json::{Value, json};

use crate::config::Settings;
use crate::error::StationError;
use crate::model::{CommandType, Mode, Status, SystemStatus, TIMESTAMP_FORMAT};

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Issues GET requests against a station API.
pub trait Transport: Send + Sync + 'static {
    /// Requests `path` and resolves with the decoded JSON body.
    fn get(&self, path: &str) -> Promise<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Station
// ─────────────────────────────────────────────────────────────────────────────

/// Typed access to a station.
#[derive(Clone)]
pub struct Station {
    transport: Arc<dyn Transport>,
}

impl Station {
    /// Creates a client over `transport`.
    pub fn new(transport: impl Transport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Sends `command` and resolves with the raw response.
    #[must_use]
    pub fn command(&self, command: CommandType) -> Promise<Value> {
        tracing::debug!(path = command.path(), "sending command");
        self.transport.get(command.path())
    }

    /// Resolves with the readings of the last `hours` hours, newest first.
    #[must_use]
    pub fn statuses(&self, hours: u32) -> Promise<Vec<Status>> {
        self.transport
            .get(&format!("/statuses/{hours}"))
            .then(Status::list_from_json)
    }

    /// Resolves with the station's run state and mode.
    #[must_use]
    pub fn system_status(&self) -> Promise<SystemStatus> {
        self.command(CommandType::Status)
            .try_then(SystemStatus::from_json)
    }
}

impl core::fmt::Debug for Station {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Station").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SimulatedStation
// ─────────────────────────────────────────────────────────────────────────────

/// Readings the simulated station starts with, newest first.
const SEED_READINGS: [(&str, f64, f64, f64, i32, bool); 6] = [
    ("2016-10-21 14:05:00.000", 21.0, 48.0, 1013.2, 415, false),
    ("2016-10-21 13:05:00.000", 20.5, 49.5, 1013.0, 430, true),
    ("2016-10-21 12:05:00.000", 20.0, 51.0, 1012.8, 440, false),
    ("2016-10-21 11:05:00.000", 19.5, 52.5, 1012.5, 455, true),
    ("2016-10-21 10:05:00.000", 19.0, 54.0, 1012.1, 470, false),
    ("2016-10-21 09:05:00.000", 18.5, 55.0, 1011.9, 480, false),
];

struct StationState {
    started: bool,
    mode: Mode,
    /// Raw status objects, newest first.
    readings: Vec<Value>,
    snapshots: u32,
}

impl StationState {
    fn respond(&mut self, path: &str) -> Option<Value> {
        if let Some(hours) = path.strip_prefix("/statuses/") {
            let hours: i64 = hours.parse().ok()?;
            return Some(self.statuses(hours));
        }

        match CommandType::from_path(path)? {
            CommandType::Start => self.started = true,
            CommandType::Stop => self.started = false,
            CommandType::Monitor => self.mode = Mode::Monitoring,
            CommandType::Surveil => self.mode = Mode::Surveillance,
            CommandType::Snapshot => self.snapshot(),
            CommandType::Status => {}
        }
        Some(json!({
            "response": {
                "system_status": { "started": self.started, "mode": self.mode.as_str() }
            }
        }))
    }

    fn latest(&self) -> Option<Status> {
        self.readings.iter().find_map(Status::from_json)
    }

    fn statuses(&self, hours: i64) -> Value {
        let cutoff = self
            .latest()
            .map(|status| status.timestamp - TimeDelta::hours(hours));
        let statuses: Vec<&Value> = self
            .readings
            .iter()
            .filter(|raw| match (cutoff, Status::from_json(raw)) {
                (Some(cutoff), Some(status)) => status.timestamp > cutoff,
                _ => true,
            })
            .collect();
        json!({ "statuses": statuses })
    }

    fn snapshot(&mut self) {
        self.snapshots += 1;
        let latest = self.latest();
        let taken_at = latest
            .as_ref()
            .map(|status| status.timestamp + TimeDelta::minutes(1))
            .unwrap_or_default();
        let mut reading = json!({
            "timestamp": format_timestamp(taken_at),
            "picture": format!("snapshot_{}.jpg", self.snapshots),
            "motion": false,
        });
        if let (Some(latest), Some(object)) = (latest, reading.as_object_mut()) {
            object.insert("temperature".into(), json!(latest.temperature));
            object.insert("humidity".into(), json!(latest.humidity));
            object.insert("pressure".into(), json!(latest.pressure));
            object.insert("co2".into(), json!(latest.co2));
        }
        self.readings.insert(0, reading);
    }
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// In-process [`Transport`] that mimics a station's API.
///
/// Responses are produced on a background thread after the configured
/// latency. Requests fail with [`StationError::SettingsMissing`] unless the
/// settings carry a site and credentials, and unknown paths fail with
/// [`StationError::EmptyResponse`].
#[derive(Clone)]
pub struct SimulatedStation {
    settings: Settings,
    latency: Duration,
    state: Arc<Mutex<StationState>>,
}

impl SimulatedStation {
    /// Creates a stopped station in monitoring mode with a few seeded readings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let readings = SEED_READINGS
            .iter()
            .enumerate()
            .map(|(i, (timestamp, temperature, humidity, pressure, co2, motion))| {
                json!({
                    "timestamp": timestamp,
                    "picture": format!("picture_{i}.jpg"),
                    "temperature": temperature,
                    "humidity": humidity,
                    "pressure": pressure,
                    "co2": co2,
                    "motion": motion,
                })
            })
            .collect();
        Self::with_readings(settings, readings)
    }

    /// Creates a station serving `readings` (raw status objects, newest first).
    #[must_use]
    pub fn with_readings(settings: Settings, readings: Vec<Value>) -> Self {
        Self {
            settings,
            latency: Duration::from_millis(20),
            state: Arc::new(Mutex::new(StationState {
                started: false,
                mode: Mode::Monitoring,
                readings,
                snapshots: 0,
            })),
        }
    }

    /// Sets the simulated round-trip latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the number of snapshots taken so far.
    #[must_use]
    pub fn snapshot_count(&self) -> u32 {
        self.state.lock().snapshots
    }
}

impl Transport for SimulatedStation {
    fn get(&self, path: &str) -> Promise<Value> {
        let loaded = self.settings.settings_loaded();
        let latency = self.latency;
        let state = Arc::clone(&self.state);
        let path = path.to_owned();

        Promise::try_new(move |resolver| -> Result<(), BoxError> {
            if !loaded {
                return Err(StationError::SettingsMissing.into());
            }
            thread::Builder::new()
                .name("piguard-station".into())
                .spawn(move || {
                    thread::sleep(latency);
                    let response = state.lock().respond(&path);
                    match response {
                        Some(json) => {
                            tracing::trace!(%path, "station responded");
                            resolver.succeed(json);
                        }
                        None => {
                            resolver.fail(StationError::EmptyResponse);
                        }
                    }
                })?;
            Ok(())
        })
    }
}

impl core::fmt::Debug for SimulatedStation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedStation")
            .field("started", &state.started)
            .field("mode", &state.mode)
            .field("readings", &state.readings.len())
            .finish()
    }
}
