//! Error types for the station client.

/// Failure reported by a station source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StationError {
    /// The station answered without any payload.
    #[error("empty response from station")]
    EmptyResponse,

    /// The station reported a status that could not be interpreted.
    #[error("invalid system status")]
    InvalidStatus,

    /// Site or credentials are not configured.
    #[error("station settings missing")]
    SettingsMissing,
}

/// Error loading [`Settings`](crate::Settings) from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The port variable is not a valid TCP port.
    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
