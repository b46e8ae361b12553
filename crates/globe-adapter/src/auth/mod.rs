/*
[INPUT]:  API credentials and request metadata
[OUTPUT]: Signed X-Access-* headers and auth errors
[POS]:    Auth layer - handles Globe API authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod credentials;
pub mod nonce;
pub mod signer;

pub use credentials::Credentials;
pub use nonce::NonceClock;
pub use signer::{
    ACCESS_KEY_HEADER, ACCESS_NONCE_HEADER, ACCESS_PASSPHRASE_HEADER, ACCESS_SIGNATURE_HEADER,
    AuthHeaders, AuthToken, RequestDescriptor, RequestSigner, auth_headers, sign,
};
