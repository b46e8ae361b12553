/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Globe adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

//! Client for the Globe derivatives exchange: a streaming WebSocket
//! connection with per-topic callbacks and order commands, plus REST
//! endpoints for history and account data.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{AuthHeaders, AuthToken, Credentials, RequestDescriptor, RequestSigner, auth_headers, sign};

pub use config::ClientConfig;
pub use error::{GlobeError, Result};
pub use http::GlobeClient;

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{Channel, ChannelMessage, ConnectionState, GlobeWebSocket, Topic};
