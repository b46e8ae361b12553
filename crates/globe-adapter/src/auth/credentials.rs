/*
[INPUT]:  API key, base64 secret and passphrase issued by the exchange
[OUTPUT]: Immutable credential bundle with redacted Debug output
[POS]:    Auth layer - credential ownership
[UPDATE]: When the exchange changes its API key format
*/

use std::fmt;

use serde::Deserialize;

/// API credentials for authenticated channels and endpoints
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Base64 encoded HMAC secret
    pub secret: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub passphrase: String,
}

impl Credentials {
    /// Create credentials without an API key
    pub fn new(secret: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            api_key: None,
            passphrase: passphrase.into(),
        }
    }

    /// Attach the API key sent as `X-Access-Key`
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret", &"<redacted>")
            .field("api_key", &self.api_key)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
