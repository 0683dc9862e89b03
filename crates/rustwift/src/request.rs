//! The request envelope shared by all handles.
//!
//! [`Request`] builds the URL from the account endpoint, an optional
//! container, an optional object and query values; sends it through the
//! [`Backend`]; and checks the status code against the expected set. Any
//! other status becomes [`Error::UnexpectedStatus`] with the response body.

use std::collections::BTreeMap;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustwift_headers::Headers;
use tracing::debug;

use crate::backend::Backend;
use crate::{Body, Error, Result};

/// Characters left unescaped in a container name (RFC 3986 unreserved).
pub(crate) const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Object names additionally keep their slashes.
pub(crate) const OBJECT_PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');

/// Extra headers and URL query values for a single request.
///
/// Headers given here override headers derived from typed arguments.
///
/// # Examples
///
/// ```
/// use rustwift::RequestOptions;
///
/// let opts = RequestOptions::new()
///     .with_header("X-Newest", "true")
///     .with_value("multipart-manifest", "get");
/// assert_eq!(opts.headers.get("x-newest"), Some("true"));
/// assert_eq!(opts.values.get("multipart-manifest").map(String::as_str), Some("get"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Additional request headers.
    pub headers: Headers,
    /// URL query values, encoded in key order.
    pub values: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Add a query value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// A single Swift request.
#[derive(Debug)]
pub(crate) struct Request<'a> {
    method: Method,
    container: Option<&'a str>,
    object: Option<&'a str>,
    headers: HeaderMap,
    values: BTreeMap<String, String>,
    body: Body,
    expect: &'static [StatusCode],
    drain: bool,
}

impl<'a> Request<'a> {
    pub(crate) fn new(method: Method, expect: &'static [StatusCode]) -> Self {
        Self {
            method,
            container: None,
            object: None,
            headers: HeaderMap::new(),
            values: BTreeMap::new(),
            body: Body::Empty,
            expect,
            drain: false,
        }
    }

    pub(crate) fn container(mut self, name: &'a str) -> Self {
        self.container = Some(name);
        self
    }

    pub(crate) fn object(mut self, name: &'a str) -> Self {
        self.object = Some(name);
        self
    }

    /// Merge headers; later calls override earlier ones.
    pub(crate) fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub(crate) fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub(crate) fn value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_owned(), value.into());
        self
    }

    /// Apply caller-supplied options on top of what was set so far.
    pub(crate) fn options(mut self, opts: Option<&RequestOptions>) -> Result<Self> {
        if let Some(opts) = opts {
            let map = opts.headers.to_header_map().map_err(Error::InvalidHeader)?;
            self.headers.extend(map);
            for (k, v) in &opts.values {
                self.values.insert(k.clone(), v.clone());
            }
        }
        Ok(self)
    }

    pub(crate) fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Discard the response body on success.
    pub(crate) fn drain_body(mut self) -> Self {
        self.drain = true;
        self
    }

    /// The full request URL below `endpoint`.
    pub(crate) fn url(&self, endpoint: &str) -> Result<String> {
        let container = self.container.filter(|c| !c.is_empty());
        if container.is_some_and(|c| c.contains('/')) {
            return Err(Error::MalformedContainerName);
        }

        let mut url = endpoint.to_owned();
        match (container, self.object) {
            (None, Some(_)) => return Err(Error::NoContainerName),
            (None, None) => {}
            (Some(c), object) => {
                url.extend(utf8_percent_encode(c, PATH_SEGMENT));
                if let Some(o) = object {
                    url.push('/');
                    url.extend(utf8_percent_encode(o, OBJECT_PATH));
                }
            }
        }

        if !self.values.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.values.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// Send the request and check its status.
    pub(crate) async fn send(self, backend: &dyn Backend) -> Result<http::Response<Body>> {
        let url = self.url(backend.endpoint_url())?;
        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(&url)
            .body(self.body)
            .map_err(|_| Error::InvalidEndpoint(url.clone()))?;
        *request.headers_mut() = self.headers;

        let response = backend.execute(request).await?;
        let status = response.status();
        debug!(
            method = %self.method,
            container = self.container.unwrap_or_default(),
            object = self.object.unwrap_or_default(),
            status = status.as_u16(),
            "swift request"
        );

        if self.expect.contains(&status) {
            if self.drain || status == StatusCode::NO_CONTENT {
                let (parts, body) = response.into_parts();
                body.drain().await?;
                return Ok(http::Response::from_parts(parts, Body::Empty));
            }
            return Ok(response);
        }

        let (parts, body) = response.into_parts();
        let body = body.collect().await?;
        Err(Error::UnexpectedStatus {
            expected: self.expect.to_vec(),
            status,
            headers: parts.headers,
            body,
        })
    }
}
