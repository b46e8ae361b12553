/*
[INPUT]:  Request method/path/body, credentials and a nonce
[OUTPUT]: HMAC-SHA256 auth tokens and X-Access-* headers
[POS]:    Auth layer - request signing for handshake and REST calls
[UPDATE]: When changing signing algorithm or header format
*/

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::credentials::Credentials;
use super::nonce::NONCE_CLOCK;
use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";
pub const ACCESS_SIGNATURE_HEADER: &str = "X-Access-Signature";
pub const ACCESS_NONCE_HEADER: &str = "X-Access-Nonce";
pub const ACCESS_PASSPHRASE_HEADER: &str = "X-Access-Passphrase";

/// The parts of a request covered by the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a str,
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(method: &'a str, path: &'a str, body: &'a str) -> Self {
        Self { method, path, body }
    }

    /// GET request with an empty body
    pub fn get(path: &'a str) -> Self {
        Self::new("GET", path, "")
    }

    fn signing_string(&self) -> String {
        format!("{}{}{}", self.method, self.path, self.body)
    }
}

/// Signature material for one request
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub passphrase: String,
    pub nonce: u64,
    pub signature: String,
    pub api_key: Option<String>,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("passphrase", &"<redacted>")
            .field("nonce", &self.nonce)
            .field("signature", &self.signature)
            .field("api_key", &self.api_key)
            .finish()
    }
}

/// The fixed `X-Access-*` header set
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    headers: [(&'static str, String); 4],
}

impl AuthHeaders {
    pub fn from_token(token: AuthToken) -> Self {
        Self {
            headers: [
                (ACCESS_KEY_HEADER, token.api_key.unwrap_or_default()),
                (ACCESS_SIGNATURE_HEADER, token.signature),
                (ACCESS_NONCE_HEADER, token.nonce.to_string()),
                (ACCESS_PASSPHRASE_HEADER, token.passphrase),
            ],
        }
    }

    /// Look up a header value, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.headers.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            if key == ACCESS_PASSPHRASE_HEADER {
                map.entry(&key, &"<redacted>");
            } else {
                map.entry(&key, &value);
            }
        }
        map.finish()
    }
}

/// Signs requests with a decoded HMAC key
#[derive(Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    key: Vec<u8>,
}

impl RequestSigner {
    /// Decode the secret once; fails with `GlobeError::Decode` on bad base64
    pub fn new(credentials: Credentials) -> Result<Self> {
        let key = BASE64.decode(credentials.secret.as_bytes())?;
        Ok(Self { credentials, key })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign with a fresh nonce
    pub fn sign(&self, request: &RequestDescriptor<'_>) -> AuthToken {
        self.sign_with_nonce(request, NONCE_CLOCK.next())
    }

    /// Sign with a caller supplied nonce
    ///
    /// Signature: base64(HMAC-SHA256(secret, "{nonce}{method}{path}{body}"))
    pub fn sign_with_nonce(&self, request: &RequestDescriptor<'_>, nonce: u64) -> AuthToken {
        let message = format!("{nonce}{}", request.signing_string());
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(message.as_bytes());

        AuthToken {
            passphrase: self.credentials.passphrase.clone(),
            nonce,
            signature: BASE64.encode(mac.finalize().into_bytes()),
            api_key: self.credentials.api_key.clone(),
        }
    }

    pub fn auth_headers(&self, request: &RequestDescriptor<'_>) -> AuthHeaders {
        AuthHeaders::from_token(self.sign(request))
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Sign a request with a fresh nonce
pub fn sign(request: &RequestDescriptor<'_>, credentials: &Credentials) -> Result<AuthToken> {
    Ok(RequestSigner::new(credentials.clone())?.sign(request))
}

/// Build the `X-Access-*` headers for a request
pub fn auth_headers(
    request: &RequestDescriptor<'_>,
    credentials: &Credentials,
) -> Result<AuthHeaders> {
    Ok(AuthHeaders::from_token(sign(request, credentials)?))
}
