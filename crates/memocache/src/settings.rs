//! Cache settings and their configuration file
//!
//! Settings live under the `cache` section of a JSON document:
//!
//! ```json
//! { "cache": { "Server": "10.0.0.5", "TTL": 24 } }
//! ```
//!
//! `TTL` is in hours. `Port` and `ConnectTimeoutMs` are optional.

use crate::error::{Error, Result};
use memocache_store::DEFAULT_REDIS_PORT;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "MEMOCACHE_CONFIG";

/// Configuration file read when [`CONFIG_ENV_VAR`] is unset
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

const SECONDS_PER_HOUR: u64 = 3600;

/// Connection and expiry settings for the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Host name or IP address of the cache server
    #[serde(rename = "Server")]
    pub server: String,

    /// Entry lifetime in hours
    #[serde(rename = "TTL")]
    pub ttl: i64,

    /// Port of the cache server
    #[serde(rename = "Port", default = "default_port")]
    pub port: u16,

    /// Upper bound on establishing the connection, in milliseconds
    #[serde(rename = "ConnectTimeoutMs", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Deserialize)]
struct ConfigFile {
    cache: Option<Settings>,
}

impl Settings {
    /// Settings for `server` with entries kept for `ttl_hours`
    pub fn new(server: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            server: server.into(),
            ttl: ttl_hours,
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Read the configuration file named by `MEMOCACHE_CONFIG`, or
    /// `appsettings.json` in the current directory
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        Self::from_file(path)
    }

    /// Read the `cache` section of the JSON file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "cannot read configuration file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate the `cache` section of a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let file: ConfigFile = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            Error::configuration(format!("invalid configuration at `{}`: {}", e.path(), e.inner()))
        })?;

        let settings = file
            .cache
            .ok_or_else(|| Error::configuration("missing `cache` section"))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the TTL is positive and the server is a host name or IP
    pub fn validate(&self) -> Result<()> {
        if self.ttl <= 0 {
            return Err(Error::configuration(format!(
                "TTL must be a positive number of hours, got {}",
                self.ttl
            )));
        }
        if !is_valid_server(&self.server) {
            return Err(Error::configuration(format!(
                "`{}` is not a valid host name or IP address",
                self.server
            )));
        }
        if self.port == 0 {
            return Err(Error::configuration("port must be non-zero"));
        }
        Ok(())
    }

    /// Entry lifetime
    pub fn ttl_duration(&self) -> Duration {
        let hours = u64::try_from(self.ttl).unwrap_or(0);
        Duration::from_secs(hours.saturating_mul(SECONDS_PER_HOUR))
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn is_valid_server(server: &str) -> bool {
    if server.parse::<IpAddr>().is_ok() {
        return true;
    }
    let host = server.strip_suffix('.').unwrap_or(server);
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn default_port() -> u16 {
    DEFAULT_REDIS_PORT
}

fn default_connect_timeout_ms() -> u64 {
    5000
}
