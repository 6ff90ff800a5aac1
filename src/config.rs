//! Client configuration loading, including how the server endpoint is derived.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{dto::ws::ClientRole, error::ConnectionError};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZCONTROL_CLIENT_CONFIG_PATH";
/// Environment variable that overrides the configured host.
const HOST_ENV: &str = "BUZZCONTROL_HOST";

const DEFAULT_HOST: &str = "buzzcontrol.local";
const DEFAULT_PATH: &str = "/ws";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Runtime configuration of one connection manager.
pub struct ClientConfig {
    /// Server host, optionally with a port (`host:port`).
    pub host: String,
    /// Use `wss://` instead of `ws://`.
    pub secure: bool,
    /// WebSocket path on the server.
    pub path: String,
    /// Fixed delay between a close and the next connection attempt.
    pub reconnect_delay_ms: u64,
    /// Interval between liveness pings while connected.
    pub heartbeat_interval_ms: u64,
    /// Restart the heartbeat countdown on every inbound frame.
    pub heartbeat_resets_on_traffic: bool,
    /// Role announced to the server after the handshake.
    pub client_type: Option<ClientRole>,
}

impl ClientConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), host = %config.host, "loaded client config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(host) = env::var(HOST_ENV).ok().filter(|host| !host.trim().is_empty()) {
            info!(host = %host, "host overridden from environment");
            self.host = host;
        }
        self
    }

    /// Build the WebSocket URL from the host, scheme and path.
    ///
    /// This is the only fatal configuration error: it is reported once when the manager is
    /// created and never retried.
    pub fn endpoint(&self) -> Result<String, ConnectionError> {
        let host = self.host.trim();
        let invalid = |reason: &str| ConnectionError::InvalidEndpoint {
            endpoint: host.to_string(),
            reason: reason.to_string(),
        };

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }
        if host.contains("://") {
            return Err(invalid("host must not include a scheme"));
        }
        if host.chars().any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#')) {
            return Err(invalid("host contains characters not allowed in an authority"));
        }
        let bad_port = host
            .rsplit_once(':')
            .is_some_and(|(_, port)| !host.ends_with(']') && port.parse::<u16>().is_err());
        if bad_port {
            return Err(invalid("port is not a number between 0 and 65535"));
        }

        let scheme = if self.secure { "wss" } else { "ws" };
        let path = self.path.trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Ok(format!("{scheme}://{host}{path}"))
    }

    /// Delay between a close and the next connection attempt.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.max(1))
    }

    /// Interval between liveness pings.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            secure: false,
            path: DEFAULT_PATH.into(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            heartbeat_resets_on_traffic: true,
            client_type: None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
