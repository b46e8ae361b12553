/*
[INPUT]:  Error sources (HTTP, WebSocket, signing, serialization, config)
[OUTPUT]: Structured error types with retry and auth hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Globe adapter
#[derive(Error, Debug)]
pub enum GlobeError {
    /// Outbound message issued before a successful connect
    #[error("WebSocket not connected")]
    NotConnected,

    /// Handshake did not complete within the configured window
    #[error("Connection timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Operation needs API credentials but none were configured
    #[error("Credentials required for {operation}")]
    AuthRequired { operation: &'static str },

    /// Underlying connection failed during connect or at runtime
    #[error("Transport error: {0}")]
    Transport(String),

    /// API secret is not valid base64
    #[error("Invalid API secret encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Error frame pushed by the server over the WebSocket
    #[error("Server error frame: {0}")]
    Server(serde_json::Value),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Header name or value could not be encoded
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GlobeError {
    /// Check if the error is worth retrying by the caller.
    ///
    /// The adapter itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GlobeError::Http(_) | GlobeError::Timeout { .. } | GlobeError::Transport(_)
        )
    }

    /// Check if error indicates missing or unusable credentials
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            GlobeError::AuthRequired { .. } | GlobeError::Decode(_)
        ) || matches!(self, GlobeError::Api { code, .. } if *code == 401 || *code == 403)
    }

    /// Check if error means the duplex channel is unusable until reconnect
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            GlobeError::NotConnected | GlobeError::Timeout { .. } | GlobeError::Transport(_)
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        GlobeError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GlobeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GlobeError::Transport(err.to_string())
    }
}

/// Result type alias for Globe operations
pub type Result<T> = std::result::Result<T, GlobeError>;
