//! Configuration management for the helper server.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Errors from loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to something that does not parse
    #[error("invalid value {value:?} for {var}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// The offending value
        value: String,
    },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (`HELPER_HOST`, default `127.0.0.1`)
    pub host: IpAddr,
    /// Port to bind to (`HELPER_PORT`, default 8000)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
        }
    }
}

impl ServerConfig {
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

        let host = match lookup("HELPER_HOST") {
            Some(value) if value.trim().eq_ignore_ascii_case("localhost") => defaults.host,
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "HELPER_HOST", value })?,
            None => defaults.host,
        };

        let port = match lookup("HELPER_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "HELPER_PORT", value })?,
            None => defaults.port,
        };

        Ok(Self { host, port })
    }

    /// Address to bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    fn load(vars: &[(&'static str, &'static str)]) -> Result<ServerConfig, ConfigError> {
        let vars = vars.to_vec();
        ServerConfig::from_lookup(move |var| {
            vars.iter()
                .find(|(k, _)| *k == var)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[test]
    fn defaults_to_localhost_8000() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8000".parse().unwrap());
    }

    #[test]
    fn reads_host_and_port() {
        let config = load(&[("HELPER_HOST", "0.0.0.0"), ("HELPER_PORT", "9001")]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:9001".parse().unwrap());

        let config = load(&[("HELPER_HOST", "localhost")]).unwrap();
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            load(&[("HELPER_PORT", "eighty")]),
            Err(ConfigError::Invalid {
                var: "HELPER_PORT",
                value: "eighty".to_string(),
            })
        );
    }
}
