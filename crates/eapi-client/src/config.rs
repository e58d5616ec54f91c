//! Config-driven connection construction.
//!
//! Automation stacks usually carry endpoint parameters in a config
//! document rather than code. [`ConnectionConfig`] deserializes one
//! endpoint's parameters; unrecognized keys in the source document are
//! ignored, so configs written for newer releases still load.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::Connection;
use eapi_transport::{HttpsTransport, TlsOptions};

/// Transport selector for [`ConnectionConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Unix domain socket on the box itself.
    #[cfg(unix)]
    Socket,
    /// Loopback HTTP on the box itself.
    HttpLocal,
    /// Plain HTTP to an explicit host.
    Http,
    /// TLS to an explicit host.
    Https,
}

/// Destination parameters for one eAPI endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Which transport binding to construct.
    pub transport: TransportKind,
    /// Destination host; required for the HTTP and HTTPS transports.
    #[serde(default)]
    pub host: Option<String>,
    /// Destination port; each transport has its own default.
    #[serde(default)]
    pub port: Option<u16>,
    /// Request path, default `/command-api`.
    #[serde(default)]
    pub path: Option<String>,
    /// Username for `Basic` authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for `Basic` authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Socket path for the unix transport, default
    /// `/var/run/command-api.sock`.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
    /// Skip TLS certificate verification (HTTPS only).
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Construction-time configuration failures, distinct from the runtime
/// error taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The selected transport needs a destination host.
    #[error("transport '{0}' requires a host")]
    MissingHost(&'static str),
}

impl Connection {
    /// Construct a connection from deserialized endpoint parameters.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        match config.transport {
            #[cfg(unix)]
            TransportKind::Socket => Ok(Self::socket(config.socket_path.clone())),
            TransportKind::HttpLocal => Ok(Self::http_local(config.port, config.path.clone())),
            TransportKind::Http => {
                let host = config.host.as_deref().ok_or(ConfigError::MissingHost("http"))?;
                Ok(Self::http(
                    host,
                    config.port,
                    config.path.clone(),
                    config.username.as_deref(),
                    config.password.as_deref(),
                ))
            }
            TransportKind::Https => {
                let host = config
                    .host
                    .as_deref()
                    .ok_or(ConfigError::MissingHost("https"))?;
                let transport = HttpsTransport::with_options(
                    host,
                    config.port,
                    config.path.clone(),
                    TlsOptions {
                        accept_invalid_certs: config.accept_invalid_certs,
                    },
                );
                let mut connection = Self::new(Box::new(transport));
                connection.authenticate(
                    config.username.as_deref().unwrap_or_default(),
                    config.password.as_deref().unwrap_or_default(),
                );
                Ok(connection)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn http_config_builds_with_defaults() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"transport": "http", "host": "veos01", "username": "admin", "password": "x"}"#,
        )
        .unwrap();
        let connection = Connection::from_config(&config).unwrap();
        assert_eq!(connection.endpoint(), "http://veos01:80/command-api");
    }

    #[test]
    fn https_config_requires_a_host() {
        let config: ConnectionConfig = serde_json::from_str(r#"{"transport": "https"}"#).unwrap();
        assert_eq!(
            Connection::from_config(&config).unwrap_err(),
            ConfigError::MissingHost("https")
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{
                "transport": "http_local",
                "port": 2048,
                "enable_frobnication": true,
                "profile": "lab"
            }"#,
        )
        .unwrap();
        let connection = Connection::from_config(&config).unwrap();
        assert_eq!(connection.endpoint(), "http://localhost:2048/command-api");
    }

    #[cfg(unix)]
    #[test]
    fn socket_config_uses_the_default_path() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"transport": "socket"}"#).unwrap();
        let connection = Connection::from_config(&config).unwrap();
        assert_eq!(connection.endpoint(), "unix:/var/run/command-api.sock");
    }

    #[test]
    fn https_config_carries_tls_options() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"transport": "https", "host": "veos01", "accept_invalid_certs": true}"#,
        )
        .unwrap();
        let connection = Connection::from_config(&config).unwrap();
        assert_eq!(connection.endpoint(), "https://veos01:443/command-api");
    }
}
