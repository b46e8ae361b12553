/*
[INPUT]:  Host, TLS flag, timeouts and optional credentials (code, serde or env)
[OUTPUT]: Validated ClientConfig shared by the REST and WebSocket clients
[POS]:    Configuration layer - connection setup
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use serde::Deserialize;

use crate::auth::Credentials;
use crate::error::{GlobeError, Result};

pub const DEFAULT_HOST: &str = "globedx.com";
/// Prefix shared by every REST endpoint and the WebSocket path
pub const API_PREFIX: &str = "/api/v1";
pub const WS_PATH: &str = "/api/v1/ws";

const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

const ENV_HOST: &str = "GLOBE_HOST";
const ENV_TLS: &str = "GLOBE_TLS";
const ENV_CONNECTION_TIMEOUT_MS: &str = "GLOBE_CONNECTION_TIMEOUT_MS";
const ENV_REQUEST_TIMEOUT_MS: &str = "GLOBE_REQUEST_TIMEOUT_MS";
const ENV_API_KEY: &str = "GLOBE_API_KEY";
const ENV_API_SECRET: &str = "GLOBE_API_SECRET";
const ENV_PASSPHRASE: &str = "GLOBE_PASSPHRASE";

/// Client configuration, immutable once a client is built
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Exchange host, without scheme (e.g. "globedx.com")
    #[serde(default = "default_host")]
    pub host: String,
    /// `wss`/`https` when true, `ws`/`http` otherwise
    #[serde(default = "default_tls")]
    pub tls: bool,
    /// WebSocket handshake deadline
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Whole-request deadline for REST calls
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            tls: default_tls(),
            connection_timeout_ms: default_connection_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `GLOBE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Credentials are only set when both secret and passphrase are present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(tls) = lookup(ENV_TLS) {
            config.tls = parse_bool(ENV_TLS, &tls)?;
        }
        if let Some(timeout) = lookup(ENV_CONNECTION_TIMEOUT_MS) {
            config.connection_timeout_ms = parse_millis(ENV_CONNECTION_TIMEOUT_MS, &timeout)?;
        }
        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &timeout)?;
        }

        if let (Some(secret), Some(passphrase)) = (lookup(ENV_API_SECRET), lookup(ENV_PASSPHRASE)) {
            let mut credentials = Credentials::new(secret, passphrase);
            if let Some(api_key) = lookup(ENV_API_KEY) {
                credentials = credentials.with_api_key(api_key);
            }
            config.credentials = Some(credentials);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_connection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Reject settings no client can work with
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(GlobeError::Config("host must not be empty".to_string()));
        }
        if host.contains("://") {
            return Err(GlobeError::Config(format!(
                "host must not include a scheme: {host}"
            )));
        }
        if self.connection_timeout_ms == 0 {
            return Err(GlobeError::Config(
                "connection_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(GlobeError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Full WebSocket URL, e.g. `wss://globedx.com/api/v1/ws`
    pub fn ws_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}{WS_PATH}", self.host)
    }

    /// REST origin without path, e.g. `https://globedx.com`
    pub fn rest_origin(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GlobeError::Config(format!("{key}: invalid boolean {other:?}"))),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|err| GlobeError::Config(format!("{key}: invalid milliseconds {value:?}: {err}")))
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_tls() -> bool {
    true
}

fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
