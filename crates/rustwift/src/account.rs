//! Account handle.

use std::fmt;
use std::sync::{Arc, LazyLock};

use http::{Method, StatusCode};
use regex::Regex;
use rustwift_headers::AccountHeaders;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::backend::Backend;
use crate::iterator::ContainerIterator;
use crate::request::{Request, RequestOptions};
use crate::{Body, Capabilities, Container, Error, Result};

static ENDPOINT_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*/)v1/(.*)/$").expect("endpoint regex is valid"));

/// A Swift account, the root of the account/container/object hierarchy.
///
/// Cloning an account is cheap; clones share the backend and the capability
/// cache but each keeps its own header cache.
#[derive(Clone)]
pub struct Account {
    backend: Arc<dyn Backend>,
    base_url: String,
    name: String,
    headers: Option<AccountHeaders>,
    capabilities: Arc<OnceCell<Capabilities>>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.backend.endpoint_url() == other.backend.endpoint_url()
    }
}

impl Eq for Account {}

impl Account {
    /// Wrap a backend. Its endpoint must look like
    /// `https://swift.example.com/v1/AUTH_test/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use rustwift::Account;
    /// use rustwift::backend::MemoryBackend;
    ///
    /// let account = Account::new(Arc::new(MemoryBackend::new())).unwrap();
    /// assert_eq!(account.name(), "AUTH_test");
    /// ```
    pub fn new(backend: Arc<dyn Backend>) -> Result<Self> {
        let endpoint = backend.endpoint_url();
        let caps = ENDPOINT_RX
            .captures(endpoint)
            .ok_or_else(|| Error::InvalidEndpoint(endpoint.to_owned()))?;
        let base_url = caps[1].to_owned();
        let name = caps[2].to_owned();
        Ok(Self {
            backend,
            base_url,
            name,
            headers: None,
            capabilities: Arc::new(OnceCell::new()),
        })
    }

    /// A handle to another account reachable with the same credentials
    /// (e.g. as a reseller admin). The backend is cloned; `self` is left
    /// untouched.
    pub fn switch_account(&self, name: &str) -> Result<Self> {
        let endpoint = format!("{}v1/{name}/", self.base_url);
        debug!(from = %self.name, to = %name, "switching account");
        Self::new(self.backend.clone_with_endpoint(&endpoint)?)
    }

    /// Account name, e.g. `AUTH_test`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cluster URL without the `v1/<account>/` suffix.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Account endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        self.backend.endpoint_url()
    }

    /// The backend this account talks through.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// A handle to a container. No request is made.
    #[must_use]
    pub fn container(&self, name: impl Into<String>) -> Container {
        Container::new(self.clone(), name.into())
    }

    /// Iterate over the containers of this account.
    #[must_use]
    pub fn containers(&self) -> ContainerIterator<'_> {
        ContainerIterator::new(self)
    }

    /// The account headers, from cache or via HEAD.
    pub async fn headers(&mut self) -> Result<AccountHeaders> {
        if let Some(headers) = &self.headers {
            return Ok(headers.clone());
        }
        let resp = Request::new(Method::HEAD, &[StatusCode::OK, StatusCode::NO_CONTENT])
            .drain_body()
            .send(self.backend.as_ref())
            .await?;
        let headers = AccountHeaders::from_header_map(resp.headers());
        headers.validate().map_err(|source| Error::MalformedHeader {
            source,
            headers: headers.clone().into_headers(),
        })?;
        self.headers = Some(headers.clone());
        Ok(headers)
    }

    /// Update account metadata (POST). Keys with empty values are removed
    /// on the server.
    pub async fn update(
        &mut self,
        headers: &AccountHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        Request::new(Method::POST, &[StatusCode::NO_CONTENT])
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .drain_body()
            .send(self.backend.as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Create the account (PUT). Usually requires reseller privileges.
    pub async fn create(
        &mut self,
        headers: &AccountHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        Request::new(Method::PUT, &[StatusCode::CREATED, StatusCode::ACCEPTED])
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .drain_body()
            .send(self.backend.as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Drop the cached headers.
    pub fn invalidate(&mut self) {
        self.headers = None;
    }

    /// The cluster's capabilities (`GET <base>/info`), fetched once and
    /// shared by all clones of this account.
    pub async fn capabilities(&self) -> Result<Capabilities> {
        let caps = self
            .capabilities
            .get_or_try_init(|| self.fetch_capabilities())
            .await?;
        Ok(caps.clone())
    }

    async fn fetch_capabilities(&self) -> Result<Capabilities> {
        let url = format!("{}info", self.base_url);
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(&url)
            .body(Body::Empty)
            .map_err(|_| Error::InvalidEndpoint(url.clone()))?;
        let resp = self.backend.execute(request).await?;
        let status = resp.status();
        let (parts, body) = resp.into_parts();
        let body = body.collect().await?;
        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus {
                expected: vec![StatusCode::OK],
                status,
                headers: parts.headers,
                body,
            });
        }
        debug!(url = %url, "fetched capabilities");
        Ok(serde_json::from_slice(&body)?)
    }
}
