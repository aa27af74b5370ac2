//! Station settings.

use crate::error::ConfigError;

/// Default HTTPS port of a station.
pub const DEFAULT_PORT: u16 = 2728;

/// Environment variable holding the station host name.
pub const SITE_VAR: &str = "PIGUARD_SITE";
/// Environment variable holding the user name.
pub const USERNAME_VAR: &str = "PIGUARD_USERNAME";
/// Environment variable holding the password.
pub const PASSWORD_VAR: &str = "PIGUARD_PASSWORD";
/// Environment variable overriding [`DEFAULT_PORT`].
pub const PORT_VAR: &str = "PIGUARD_PORT";

/// Login for a station.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub user_name: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    #[must_use]
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where and how to reach a station.
///
/// Passed explicitly to every station source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Host name of the station.
    pub site: Option<String>,
    /// Login, if configured.
    pub credentials: Option<Credentials>,
    /// HTTPS port.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site: None,
            credentials: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Creates empty settings on the default port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the station host name.
    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    /// Sets the login.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup(PORT_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let credentials = match (lookup(USERNAME_VAR), lookup(PASSWORD_VAR)) {
            (Some(user_name), Some(password)) => Some(Credentials::new(user_name, password)),
            _ => None,
        };

        Ok(Self {
            site: lookup(SITE_VAR).filter(|site| !site.is_empty()),
            credentials,
            port,
        })
    }

    /// Returns `true` when both site and credentials are present.
    #[must_use]
    pub fn settings_loaded(&self) -> bool {
        self.site.is_some() && self.credentials.is_some()
    }

    /// Returns `https://{site}:{port}` when settings are loaded.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        if !self.settings_loaded() {
            return None;
        }
        let site = self.site.as_deref()?;
        Some(format!("https://{site}:{}", self.port))
    }

    /// Returns `https://{user}:{password}@{site}:{port}` when settings are loaded.
    #[must_use]
    pub fn base_url_with_credentials(&self) -> Option<String> {
        let (Some(site), Some(credentials)) = (&self.site, &self.credentials) else {
            return None;
        };
        Some(format!(
            "https://{}:{}@{site}:{}",
            credentials.user_name, credentials.password, self.port
        ))
    }
}
