use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::error::{Error, Result};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Runtime settings for the HTTP service, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// `development` exposes internal error details in 500 responses.
    pub environment: String,
    /// The single origin allowed by CORS.
    pub allowed_origin: String,
    /// Rollup store path; `None` means the default location.
    pub db_path: Option<PathBuf>,
    /// Fixed UTC offset, in minutes, used to decide which day is "today".
    pub tz_offset_minutes: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            db_path: None,
            tz_offset_minutes: 0,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults;
    /// set-but-malformed keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host
                .parse()
                .map_err(|_| Error::Config(format!("HOST is not an IP address: {host:?}")))?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {port:?}")))?;
        }
        if let Some(env) = lookup("APP_ENV") {
            config.environment = env;
        }
        if let Some(origin) = lookup("ALLOWED_ORIGIN") {
            if origin.trim().is_empty() {
                return Err(Error::Config("ALLOWED_ORIGIN must not be empty".into()));
            }
            config.allowed_origin = origin;
        }
        if let Some(path) = lookup("CLINIC_METRICS_DB") {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(offset) = lookup("CLINIC_TZ_OFFSET_MINUTES") {
            let minutes: i32 = offset.parse().map_err(|_| {
                Error::Config(format!("CLINIC_TZ_OFFSET_MINUTES is not an integer: {offset:?}"))
            })?;
            if minutes.abs() >= 24 * 60 {
                return Err(Error::Config(format!(
                    "CLINIC_TZ_OFFSET_MINUTES out of range: {minutes}"
                )));
            }
            config.tz_offset_minutes = minutes;
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
