//! Station data model and its JSON decoding.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StationError;

/// Timestamp layout used by the station, e.g. `2016-10-21 14:05:00.000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ─────────────────────────────────────────────────────────────────────────────
// CommandType
// ─────────────────────────────────────────────────────────────────────────────

/// Command accepted by a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// Start sampling.
    Start,
    /// Stop sampling.
    Stop,
    /// Report the system status.
    Status,
    /// Take a picture now.
    Snapshot,
    /// Switch to monitoring mode.
    Monitor,
    /// Switch to surveillance mode.
    Surveil,
}

impl CommandType {
    /// Returns the API path of the command.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Start => "/command/start",
            Self::Stop => "/command/stop",
            Self::Status => "/command/status",
            Self::Snapshot => "/command/snapshot",
            Self::Monitor => "/command/monitor",
            Self::Surveil => "/command/surveil",
        }
    }

    /// Parses an API path back into a command.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        [
            Self::Start,
            Self::Stop,
            Self::Status,
            Self::Snapshot,
            Self::Monitor,
            Self::Surveil,
        ]
        .into_iter()
        .find(|command| command.path() == path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// One sensor reading with its picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// When the reading was taken.
    pub timestamp: NaiveDateTime,
    /// Name of the picture taken with the reading.
    pub picture_name: String,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    pub humidity: Option<f64>,
    /// Pressure in mbar.
    pub pressure: Option<f64>,
    /// CO2 concentration in ppm.
    pub co2: Option<i32>,
    /// Whether motion was detected.
    pub motion: Option<bool>,
}

#[derive(Deserialize)]
struct RawStatus {
    timestamp: String,
    picture: String,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
    #[serde(default)]
    co2: Option<i32>,
    #[serde(default)]
    motion: Option<bool>,
}

impl Status {
    /// Decodes one status object, or `None` if it lacks a valid timestamp or picture.
    #[must_use]
    pub fn from_json(json: &Value) -> Option<Self> {
        let raw = RawStatus::deserialize(json).ok()?;
        let timestamp = NaiveDateTime::parse_from_str(&raw.timestamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            timestamp,
            picture_name: raw.picture,
            temperature: raw.temperature,
            humidity: raw.humidity,
            pressure: raw.pressure,
            co2: raw.co2,
            motion: raw.motion,
        })
    }

    /// Decodes the `statuses` array of a response, skipping malformed entries.
    #[must_use]
    pub fn list_from_json(json: &Value) -> Vec<Self> {
        json.get("statuses")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::from_json).collect())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SystemStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the station is sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Sampling.
    Started,
    /// Idle.
    Stopped,
}

/// What the station does with its readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record readings only.
    Monitoring,
    /// Record readings and react to motion.
    Surveillance,
}

impl Mode {
    /// Returns the wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monitoring => "monitoring",
            Self::Surveillance => "surveillance",
        }
    }
}

/// Run state and mode reported by a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    /// Run state.
    pub status: RunState,
    /// Mode.
    pub mode: Mode,
}

#[derive(Deserialize)]
struct RawSystemStatus {
    started: bool,
    mode: Mode,
}

impl SystemStatus {
    /// Decodes `response.system_status` of a command response.
    pub fn from_json(json: &Value) -> Result<Self, StationError> {
        let raw = json
            .pointer("/response/system_status")
            .and_then(|value| RawSystemStatus::deserialize(value).ok())
            .ok_or(StationError::InvalidStatus)?;
        Ok(Self {
            status: if raw.started {
                RunState::Started
            } else {
                RunState::Stopped
            },
            mode: raw.mode,
        })
    }
}
