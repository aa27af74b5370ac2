//! Presentation state of the station summary screen.

use std::time::Duration;

use chrono::NaiveDateTime;
use piguard_observable::Cell;
use piguard_promise::{Error, Promise, Resolver};

use crate::config::Settings;
use crate::error::StationError;
use crate::model::{CommandType, Mode, RunState, Status, SystemStatus};
use crate::station::Station;

/// How many hours of readings the summary shows.
pub const HISTORY_HOURS: u32 = 24;

/// Default pause between a snapshot command and reloading the readings.
pub const SNAPSHOT_DELAY: Duration = Duration::from_secs(2);

/// Observable presentation state for the summary screen.
///
/// Every field is a [`Cell`]; views observe the cells they render. Loading
/// operations return the promise driving them so callers may wait on it, but
/// their effects land in the cells either way. Failures are published to
/// [`last_error`](Self::last_error).
///
/// Cloning yields another handle to the same cells.
#[derive(Clone)]
pub struct SummaryViewModel {
    station: Station,
    settings: Settings,
    snapshot_delay: Duration,

    /// URL of the latest picture.
    pub picture: Cell<Option<String>>,
    /// Day of the latest reading, e.g. `21 Oct`.
    pub date: Cell<String>,
    /// Time of the latest reading, e.g. `14:05`.
    pub time: Cell<String>,
    /// Latest temperature, e.g. `21°C`.
    pub temperature: Cell<Option<String>>,
    /// Latest humidity, e.g. `48%`.
    pub humidity: Cell<Option<String>>,
    /// Latest pressure, e.g. `1013.2mbar`.
    pub pressure: Cell<Option<String>>,
    /// Latest CO2 level, e.g. `415ppm`.
    pub co2: Cell<Option<String>>,

    /// Temperature readings, oldest first, labelled `HH:MM`.
    pub temperature_history: Cell<Vec<(f64, String)>>,
    /// Humidity readings, oldest first, labelled `HH:MM`.
    pub humidity_history: Cell<Vec<(f64, String)>>,
    /// Pressure readings, oldest first, labelled `HH:MM`.
    pub pressure_history: Cell<Vec<(f64, String)>>,
    /// CO2 readings, oldest first, labelled `HH:MM`.
    pub co2_history: Cell<Vec<(i32, String)>>,
    /// Readings that detected motion, newest first, with their picture.
    pub motion_history: Cell<Vec<(NaiveDateTime, String)>>,

    /// Whether the station is sampling.
    pub system_on: Cell<bool>,
    /// Whether the station is in surveillance mode.
    pub surveillance_on: Cell<bool>,
    /// Message of the most recent failed operation.
    pub last_error: Cell<Option<String>>,
}

impl SummaryViewModel {
    /// Creates a view model with placeholder values.
    #[must_use]
    pub fn new(station: Station, settings: Settings) -> Self {
        Self {
            station,
            settings,
            snapshot_delay: SNAPSHOT_DELAY,
            picture: Cell::new(None),
            date: Cell::new("01 Jan".to_owned()),
            time: Cell::new("00:00".to_owned()),
            temperature: Cell::new(None),
            humidity: Cell::new(None),
            pressure: Cell::new(None),
            co2: Cell::new(None),
            temperature_history: Cell::default(),
            humidity_history: Cell::default(),
            pressure_history: Cell::default(),
            co2_history: Cell::default(),
            motion_history: Cell::default(),
            system_on: Cell::new(false),
            surveillance_on: Cell::new(false),
            last_error: Cell::new(None),
        }
    }

    /// Sets the pause between a snapshot and the reload that follows it.
    #[must_use]
    pub fn with_snapshot_delay(mut self, delay: Duration) -> Self {
        self.snapshot_delay = delay;
        self
    }

    /// Returns the live video URL, if settings are loaded.
    #[must_use]
    pub fn streaming_url(&self) -> Option<String> {
        self.settings
            .base_url_with_credentials()
            .map(|base| format!("{base}/live_video"))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads the last day of readings into the sensor and history cells.
    ///
    /// Fails with [`StationError::EmptyResponse`] if the station has no
    /// readings.
    pub fn load_data(&self) -> Promise<Vec<Status>> {
        let model = self.clone();
        self.station
            .statuses(HISTORY_HOURS)
            .try_then(|statuses| {
                if statuses.is_empty() {
                    Err(StationError::EmptyResponse)
                } else {
                    Ok(statuses.clone())
                }
            })
            .on_success(move |statuses| model.present_statuses(statuses))
            .on_error(self.report("loading readings"))
    }

    /// Loads the station's run state and mode.
    pub fn load_status(&self) -> Promise<SystemStatus> {
        let model = self.clone();
        self.station
            .system_status()
            .on_success(move |status| model.present_status(status))
            .on_error(self.report("loading system status"))
    }

    /// Takes a picture, waits for the station to store it, then reloads the readings.
    pub fn take_snapshot(&self) -> Promise<Vec<Status>> {
        let model = self.clone();
        self.station
            .command(CommandType::Snapshot)
            .wait(self.snapshot_delay)
            .on_error(self.report("taking snapshot"))
            .and_then(move |_, resolver: Resolver<Vec<Status>>| {
                let failed = resolver.clone();
                model
                    .load_data()
                    .on_success(move |statuses| {
                        resolver.succeed(statuses.clone());
                    })
                    .on_error(move |error| {
                        failed.reject(error.clone());
                    });
            })
    }

    /// Starts a stopped station or stops a running one.
    pub fn start_and_stop(&self) -> Promise<SystemStatus> {
        let command = if self.system_on.get() {
            CommandType::Stop
        } else {
            CommandType::Start
        };
        self.send(command)
    }

    /// Switches between monitoring and surveillance mode.
    pub fn toggle_surveillance(&self) -> Promise<SystemStatus> {
        let command = if self.surveillance_on.get() {
            CommandType::Monitor
        } else {
            CommandType::Surveil
        };
        self.send(command)
    }

    fn send(&self, command: CommandType) -> Promise<SystemStatus> {
        let model = self.clone();
        self.station
            .command(command)
            .try_then(SystemStatus::from_json)
            .on_success(move |status| model.present_status(status))
            .on_error(self.report(command.path()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presentation
    // ─────────────────────────────────────────────────────────────────────────

    fn present_statuses(&self, statuses: &[Status]) {
        let Some(latest) = statuses.first() else {
            return;
        };
        tracing::debug!(readings = statuses.len(), "presenting readings");

        self.date.set(latest.timestamp.format("%d %b").to_string());
        self.time.set(latest.timestamp.format("%H:%M").to_string());
        self.temperature
            .set(latest.temperature.map(|v| format!("{v}°C")));
        self.humidity.set(latest.humidity.map(|v| format!("{v}%")));
        self.pressure.set(latest.pressure.map(|v| format!("{v}mbar")));
        self.co2.set(latest.co2.map(|v| format!("{v}ppm")));

        self.motion_history.set(
            statuses
                .iter()
                .filter(|status| status.motion.unwrap_or(false))
                .map(|status| (status.timestamp, status.picture_name.clone()))
                .collect(),
        );

        if let Some(base) = self.settings.base_url_with_credentials() {
            self.picture
                .set(Some(format!("{base}/image/{}", latest.picture_name)));
        }

        self.temperature_history
            .set(history(statuses, |status| status.temperature));
        self.humidity_history
            .set(history(statuses, |status| status.humidity));
        self.pressure_history
            .set(history(statuses, |status| status.pressure));
        self.co2_history.set(history(statuses, |status| status.co2));
    }

    fn present_status(&self, status: &SystemStatus) {
        self.system_on.set(status.status == RunState::Started);
        self.surveillance_on.set(status.mode == Mode::Surveillance);
    }

    /// Returns an error handler that logs and publishes failures of `operation`.
    fn report(&self, operation: &'static str) -> impl FnOnce(&Error) + Send + 'static {
        let last_error = self.last_error.clone();
        move |error: &Error| {
            tracing::warn!(operation, %error, "station request failed");
            last_error.set(Some(error.to_string()));
        }
    }
}

impl core::fmt::Debug for SummaryViewModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SummaryViewModel")
            .field("date", &self.date.get())
            .field("time", &self.time.get())
            .field("system_on", &self.system_on.get())
            .field("surveillance_on", &self.surveillance_on.get())
            .finish_non_exhaustive()
    }
}

/// Collects the present values of one sensor, oldest first, labelled `HH:MM`.
fn history<V>(statuses: &[Status], sensor: impl Fn(&Status) -> Option<V>) -> Vec<(V, String)> {
    statuses
        .iter()
        .rev()
        .filter_map(|status| {
            sensor(status).map(|value| (value, status.timestamp.format("%H:%M").to_string()))
        })
        .collect()
}
