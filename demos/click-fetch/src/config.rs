//! Configuration management for click-fetch.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unlike unset variables, values that are set but do not parse are errors.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.reddit.com/search.json";

/// Errors from loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to something that does not parse
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Search endpoint (`CLICK_FETCH_ENDPOINT`)
    pub endpoint: String,
    /// Value of the `limit` query parameter (`CLICK_FETCH_LIMIT`, default 5)
    pub limit: u32,
    /// Per-fetch timeout in seconds (`CLICK_FETCH_TIMEOUT_SECS`, default 10)
    pub timeout_secs: u64,
    /// Abort a fetch when a newer click arrives (`CLICK_FETCH_CANCEL_SUPERSEDED`, default true)
    pub cancel_superseded: bool,
    /// Graceful shutdown timeout in seconds (`CLICK_FETCH_SHUTDOWN_SECS`, default 5)
    pub shutdown_secs: u64,
    /// Install the Prometheus recorder (`CLICK_FETCH_METRICS`, default false)
    pub metrics: bool,
    /// Address of the health/metrics endpoint (`CLICK_FETCH_ADMIN_ADDR`, off when unset)
    pub admin_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            limit: 5,
            timeout_secs: 10,
            cancel_superseded: true,
            shutdown_secs: 5,
            metrics: false,
            admin_addr: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            endpoint: lookup("CLICK_FETCH_ENDPOINT").unwrap_or(defaults.endpoint),
            limit: parsed(&lookup, "CLICK_FETCH_LIMIT")?.unwrap_or(defaults.limit),
            timeout_secs: parsed(&lookup, "CLICK_FETCH_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeout_secs),
            cancel_superseded: flag(&lookup, "CLICK_FETCH_CANCEL_SUPERSEDED")?
                .unwrap_or(defaults.cancel_superseded),
            shutdown_secs: parsed(&lookup, "CLICK_FETCH_SHUTDOWN_SECS")?
                .unwrap_or(defaults.shutdown_secs),
            metrics: flag(&lookup, "CLICK_FETCH_METRICS")?.unwrap_or(defaults.metrics),
            admin_addr: parsed(&lookup, "CLICK_FETCH_ADMIN_ADDR")?,
        })
    }

    /// Per-fetch timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Graceful shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value,
                reason: "expected a boolean".to_string(),
            }),
        })
        .transpose()
}
