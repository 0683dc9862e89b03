//! `reqwest`-based backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use http::header::USER_AGENT;
use http::{HeaderValue, StatusCode};
use parking_lot::RwLock;
use rustwift_auth::{Authenticator, Credentials};
use rustwift_headers::HeaderError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use super::Backend;
use crate::{Body, Error, Result};

/// HTTP backend configuration.
///
/// # Examples
///
/// ```
/// use rustwift::backend::HttpBackendConfig;
///
/// let config = HttpBackendConfig::builder().request_timeout_secs(30).build();
/// assert_eq!(config.request_timeout_secs, 30);
/// assert!(config.user_agent.starts_with("rustwift/"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct HttpBackendConfig {
    /// Value of the `User-Agent` header.
    #[builder(default = default_user_agent())]
    pub user_agent: String,

    /// Timeout for a whole request, including the body transfer.
    #[builder(default = 300)]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection.
    #[builder(default = 10)]
    pub connect_timeout_secs: u64,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: 300,
            connect_timeout_secs: 10,
        }
    }
}

fn default_user_agent() -> String {
    format!("rustwift/{}", env!("CARGO_PKG_VERSION"))
}

/// A backend that talks to Swift over HTTP.
///
/// The token is cached behind a lock shared by every clone (including those
/// made by [`Backend::clone_with_endpoint`]), so a re-authentication by one
/// handle is seen by all.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    authenticator: Arc<dyn Authenticator>,
    token: Arc<RwLock<Option<String>>>,
    endpoint_url: String,
    user_agent: HeaderValue,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoint_url", &self.endpoint_url)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Authenticate once and create a backend for the storage URL returned
    /// by the authenticator.
    pub async fn connect(
        authenticator: Arc<dyn Authenticator>,
        config: HttpBackendConfig,
    ) -> Result<Self> {
        let credentials = authenticator.authenticate().await?;
        Self::with_credentials(authenticator, credentials, &config)
    }

    /// Create a backend from credentials obtained elsewhere.
    pub fn with_credentials(
        authenticator: Arc<dyn Authenticator>,
        credentials: Credentials,
        config: &HttpBackendConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|_| {
            Error::InvalidHeader(HeaderError::InvalidValue(USER_AGENT.to_string()))
        })?;
        debug!(endpoint = %credentials.storage_url, "created HTTP backend");
        Ok(Self {
            client,
            authenticator,
            token: Arc::new(RwLock::new(Some(credentials.token))),
            endpoint_url: credentials.storage_url,
            user_agent,
        })
    }

    async fn current_token(&self) -> Result<String> {
        let cached = self.token.read().clone();
        if let Some(token) = cached {
            return Ok(token);
        }
        self.reauthenticate().await
    }

    async fn reauthenticate(&self) -> Result<String> {
        debug!(endpoint = %self.endpoint_url, "re-authenticating");
        *self.token.write() = None;
        let credentials = self.authenticator.authenticate().await?;
        *self.token.write() = Some(credentials.token.clone());
        Ok(credentials.token)
    }

    async fn send(
        &self,
        parts: &http::request::Parts,
        body: Body,
        token: &str,
    ) -> Result<http::Response<Body>> {
        let mut req = self
            .client
            .request(parts.method.clone(), parts.uri.to_string())
            .headers(parts.headers.clone())
            .header("X-Auth-Token", token)
            .header(USER_AGENT, self.user_agent.clone());
        req = match body {
            Body::Empty => req,
            Body::Bytes(b) => req.body(b),
            Body::Stream(s) => req.body(reqwest::Body::wrap_stream(s)),
        };

        let resp = req.send().await?;
        let mut out = http::Response::new(Body::empty());
        *out.status_mut() = resp.status();
        *out.headers_mut() = resp.headers().clone();
        *out.body_mut() = Body::from_stream(resp.bytes_stream().map_err(std::io::Error::other));
        Ok(out)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn clone_with_endpoint(&self, endpoint_url: &str) -> Result<Arc<dyn Backend>> {
        let mut cloned = self.clone();
        cloned.endpoint_url = endpoint_url.to_owned();
        Ok(Arc::new(cloned))
    }

    async fn execute(&self, request: http::Request<Body>) -> Result<http::Response<Body>> {
        let (parts, body) = request.into_parts();
        let replay = body.try_clone();

        let token = self.current_token().await?;
        let resp = self.send(&parts, body, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let Some(body) = replay else {
            debug!(uri = %parts.uri, "token rejected, body cannot be replayed");
            return Ok(resp);
        };
        resp.into_body().drain().await?;
        let token = self.reauthenticate().await?;
        self.send(&parts, body, &token).await
    }
}
