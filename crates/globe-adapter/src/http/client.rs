/*
[INPUT]:  Client configuration (host, TLS, timeout, credentials)
[OUTPUT]: Configured reqwest client with public and signed request builders
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing signing behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{RequestDescriptor, RequestSigner};
use crate::config::{API_PREFIX, ClientConfig};
use crate::error::{GlobeError, Result};

/// REST client for the Globe exchange
#[derive(Debug, Clone)]
pub struct GlobeClient {
    http_client: Client,
    origin: Url,
    signer: Option<RequestSigner>,
    config: ClientConfig,
}

impl GlobeClient {
    /// Create a public client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client; credentials in the config enable signed endpoints
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http_client = Client::builder().timeout(config.request_timeout()).build()?;
        let origin = Url::parse(&config.rest_origin())?;
        let signer = config
            .credentials
            .clone()
            .map(RequestSigner::new)
            .transpose()?;

        Ok(Self {
            http_client,
            origin,
            signer,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// `{origin}/api/v1/{segments..}` with the given query pairs.
    ///
    /// Each segment is percent-encoded, so `/`, `?` and `#` inside an
    /// instrument stay within its segment.
    pub(crate) fn endpoint_url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|_| GlobeError::Config(format!("{} cannot carry a path", self.origin)))?
            .clear()
            .extend(API_PREFIX.split('/').filter(|segment| !segment.is_empty()))
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) fn public_request(&self, url: Url) -> RequestBuilder {
        self.http_client.request(Method::GET, url)
    }

    /// GET builder carrying the `X-Access-*` headers.
    ///
    /// The signature covers the path and query string with an empty body.
    pub(crate) fn signed_request(&self, url: Url, operation: &'static str) -> Result<RequestBuilder> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(GlobeError::AuthRequired { operation })?;

        let signed_path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        let headers = signer.auth_headers(&RequestDescriptor::get(&signed_path));

        let mut builder = self.http_client.request(Method::GET, url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        Ok(builder)
    }

    /// Send and parse a JSON body; non-2xx statuses become `GlobeError::Api`
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path = url.path(), "rest request failed");
            return Err(GlobeError::api_error(status, text));
        }

        debug!(status = status.as_u16(), path = url.path(), bytes = text.len(), "rest response");
        Ok(serde_json::from_str(&text)?)
    }
}
