//! Station summary built on PiGuard promises and observable cells.
//!
//! The summary screen of a PiGuard station client, without the UI toolkit:
//! a [`SummaryViewModel`] exposes the latest readings as observable cells,
//! and a [`SummaryView`] renders them into text labels.
//!
//! # Architecture
//!
//! ```text
//! Transport ──Promise<Value>──▶ Station ──Promise<Vec<Status>>──▶ SummaryViewModel ──Cell<T>──▶ SummaryView
//! ```
//!
//! [`SimulatedStation`] stands in for the station's HTTPS API.

mod config;
mod demo;
mod error;
mod model;
mod station;
mod view;
mod view_model;

pub use config::{
    Credentials, DEFAULT_PORT, PASSWORD_VAR, PORT_VAR, SITE_VAR, Settings, USERNAME_VAR,
};
pub use demo::run_refresh_cycle;
pub use error::{ConfigError, StationError};
pub use model::{CommandType, Mode, RunState, Status, SystemStatus, TIMESTAMP_FORMAT};
pub use station::{SimulatedStation, Station, Transport};
pub use view::SummaryView;
pub use view_model::{HISTORY_HOURS, SNAPSHOT_DELAY, SummaryViewModel};
