//! panel::client
//!
//! HTTP dispatcher for the hosting panel API.
//!
//! Every call is a single form-encoded POST with a fixed 20 second timeout.
//! The response body is returned verbatim whatever the HTTP status, because
//! the panel reports failures inside the body. Transport failures are
//! errors. There is no retry.

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::params::FormParams;
use super::signer::{sign, Clock, SystemClock};

/// Timeout applied to every panel request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors from panel operations.
#[derive(Debug, Error)]
pub enum PanelError {
    /// The request never produced a readable response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The panel answered with an error envelope.
    #[error("panel error: {0}")]
    Api(String),

    /// A named resource was not present in a panel listing.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

/// Client for one panel host.
#[derive(Debug, Clone)]
pub struct PanelClient {
    client: Client,
    host: String,
}

impl PanelClient {
    /// Create a client for `host`, e.g. `http://127.0.0.1:8888`.
    ///
    /// A trailing slash on the host is dropped so paths can be appended.
    pub fn new(host: impl Into<String>) -> Result<Self, PanelError> {
        Self::with_timeout(host, REQUEST_TIMEOUT)
    }

    /// Create a client with a different request timeout.
    #[doc(hidden)]
    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Result<Self, PanelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PanelError::Client)?;
        let host = host.into().trim_end_matches('/').to_string();
        Ok(Self { client, host })
    }

    /// The host this client posts to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL for a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// POST `params` to `path` and return the body as text.
    pub async fn post_form(&self, path: &str, params: &FormParams) -> Result<String, PanelError> {
        let url = self.url(path);
        debug!(url = %url, params = ?params, "panel request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .body(params.encode())
            .send()
            .await
            .map_err(|source| PanelError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| PanelError::Transport {
                url: url.clone(),
                source,
            })?;
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "panel response");
        Ok(body)
    }

    /// Sign `params` with `key` using the wall clock, then POST.
    pub async fn signed_post(
        &self,
        path: &str,
        key: &str,
        params: FormParams,
    ) -> Result<String, PanelError> {
        self.signed_post_with_clock(path, key, params, &SystemClock)
            .await
    }

    /// Sign with an explicit clock, then POST.
    pub async fn signed_post_with_clock(
        &self,
        path: &str,
        key: &str,
        params: FormParams,
        clock: &dyn Clock,
    ) -> Result<String, PanelError> {
        let signed = sign(key, params, clock);
        self.post_form(path, &signed).await
    }
}
