//! Container handle.

use http::{Method, StatusCode};
use rustwift_headers::ContainerHeaders;

use crate::iterator::ObjectIterator;
use crate::request::{Request, RequestOptions};
use crate::{Account, Error, Object, Result};

/// A container within an [`Account`].
///
/// Creating a handle makes no request. Headers are fetched on first use and
/// cached until [`Container::invalidate`] or a mutating call.
#[derive(Debug, Clone)]
pub struct Container {
    account: Account,
    name: String,
    headers: Option<ContainerHeaders>,
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.account == other.account && self.name == other.name
    }
}

impl Eq for Container {}

impl Container {
    pub(crate) fn new(account: Account, name: String) -> Self {
        Self {
            account,
            name,
            headers: None,
        }
    }

    /// The account holding this container.
    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A handle to an object in this container. No request is made.
    #[must_use]
    pub fn object(&self, name: impl Into<String>) -> Object {
        Object::new(self.clone(), name.into())
    }

    /// Iterate over the objects in this container.
    #[must_use]
    pub fn objects(&self) -> ObjectIterator<'_> {
        ObjectIterator::new(self)
    }

    /// Whether the container exists. A 404 is not an error.
    pub async fn exists(&mut self) -> Result<bool> {
        match self.headers().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_status(StatusCode::NOT_FOUND) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The container headers, from cache or via HEAD.
    pub async fn headers(&mut self) -> Result<ContainerHeaders> {
        if let Some(headers) = &self.headers {
            return Ok(headers.clone());
        }
        let resp = Request::new(Method::HEAD, &[StatusCode::OK, StatusCode::NO_CONTENT])
            .container(&self.name)
            .drain_body()
            .send(self.account.backend().as_ref())
            .await?;
        let headers = ContainerHeaders::from_header_map(resp.headers());
        headers.validate().map_err(|source| Error::MalformedHeader {
            source,
            headers: headers.clone().into_headers(),
        })?;
        self.headers = Some(headers.clone());
        Ok(headers)
    }

    /// Update container metadata (POST). Keys with empty values are removed
    /// on the server.
    pub async fn update(
        &mut self,
        headers: &ContainerHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        Request::new(Method::POST, &[StatusCode::NO_CONTENT])
            .container(&self.name)
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .send(self.account.backend().as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Create the container (PUT). Succeeds if it exists already, in which
    /// case the given headers are applied to it.
    pub async fn create(
        &mut self,
        headers: &ContainerHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        Request::new(Method::PUT, &[StatusCode::CREATED, StatusCode::ACCEPTED])
            .container(&self.name)
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .drain_body()
            .send(self.account.backend().as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Create the container unless it exists.
    pub async fn ensure_exists(&mut self) -> Result<()> {
        if self.exists().await? {
            return Ok(());
        }
        self.create(&ContainerHeaders::new(), None).await
    }

    /// Delete the container. Swift answers 409 if it still holds objects.
    pub async fn delete(&mut self, opts: Option<&RequestOptions>) -> Result<()> {
        Request::new(Method::DELETE, &[StatusCode::NO_CONTENT])
            .container(&self.name)
            .options(opts)?
            .send(self.account.backend().as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Drop the cached headers.
    pub fn invalidate(&mut self) {
        self.headers = None;
    }
}
