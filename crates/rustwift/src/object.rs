//! Object handle: upload, download, metadata, deletion and temporary URLs.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use http::header::ETAG;
use http::{Method, StatusCode};
use rustwift_auth::TempUrlDigest;
use rustwift_headers::ObjectHeaders;
use tracing::debug;

use crate::checksums::{HashingStream, compute_md5};
use crate::request::{Request, RequestOptions};
use crate::{Account, Body, Container, Error, Result};

/// Options for [`Object::delete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// If the object is a large object, bulk-delete its segments after the
    /// manifest is gone.
    pub delete_segments: bool,
}

/// An object within a [`Container`].
#[derive(Debug, Clone)]
pub struct Object {
    container: Container,
    name: String,
    headers: Option<ObjectHeaders>,
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.name == other.name
    }
}

impl Eq for Object {}

impl Object {
    pub(crate) fn new(container: Container, name: String) -> Self {
        Self {
            container,
            name,
            headers: None,
        }
    }

    /// The container holding this object.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The account holding this object.
    #[must_use]
    pub fn account(&self) -> &Account {
        self.container.account()
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `container/object`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.container.name(), self.name)
    }

    /// The public URL of this object (without credentials).
    pub fn url(&self) -> Result<String> {
        self.request(Method::GET, &[])
            .url(self.account().endpoint_url())
    }

    fn request(&self, method: Method, expect: &'static [StatusCode]) -> Request<'_> {
        Request::new(method, expect)
            .container(self.container.name())
            .object(&self.name)
    }

    /// Whether the object exists. A 404 is not an error.
    pub async fn exists(&mut self) -> Result<bool> {
        match self.headers().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_status(StatusCode::NOT_FOUND) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The object headers, from cache or via HEAD.
    pub async fn headers(&mut self) -> Result<ObjectHeaders> {
        if let Some(headers) = &self.headers {
            return Ok(headers.clone());
        }
        let resp = self
            .request(Method::HEAD, &[StatusCode::OK])
            .drain_body()
            .send(self.account().backend().as_ref())
            .await?;
        let headers = parse_headers(resp.headers())?;
        self.headers = Some(headers.clone());
        Ok(headers)
    }

    /// Replace the object's metadata (POST).
    pub async fn update(
        &mut self,
        headers: &ObjectHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        self.request(Method::POST, &[StatusCode::ACCEPTED])
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .drain_body()
            .send(self.account().backend().as_ref())
            .await?;
        self.invalidate();
        Ok(())
    }

    /// Upload new content (PUT).
    ///
    /// Buffered bodies get `Content-Length` and `Etag` set up front unless the
    /// caller supplied them, so Swift rejects corrupted uploads with 422.
    /// Streamed bodies are hashed on the way out and compared against the
    /// `Etag` Swift returns.
    pub async fn upload(
        &mut self,
        body: impl Into<Body>,
        headers: &ObjectHeaders,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        self.put(body.into(), headers.clone(), opts, true).await
    }

    pub(crate) async fn put(
        &mut self,
        body: Body,
        mut headers: ObjectHeaders,
        opts: Option<&RequestOptions>,
        verify: bool,
    ) -> Result<()> {
        let caller_etag = headers.etag().exists()
            || opts.is_some_and(|o| o.headers.contains("Etag"));

        let (body, hasher) = match body.as_bytes() {
            Some(bytes) => {
                if !headers.size_bytes().exists() {
                    headers.size_bytes_mut().set(bytes.len() as u64);
                }
                if verify && !caller_etag {
                    headers.etag_mut().set(compute_md5(&bytes));
                }
                (Body::from(bytes), None)
            }
            None if verify && !caller_etag => {
                let (stream, handle) = HashingStream::new(body.into_stream());
                (Body::from_stream(stream), Some(handle))
            }
            None => (body, None),
        };

        let resp = self
            .request(Method::PUT, &[StatusCode::CREATED])
            .headers(headers.to_header_map().map_err(Error::InvalidHeader)?)
            .options(opts)?
            .body(body)
            .drain_body()
            .send(self.account().backend().as_ref())
            .await?;
        self.invalidate();

        if let Some(handle) = hasher {
            let expected = handle.result().md5_hex;
            let actual = resp
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .trim_matches('"')
                .to_owned();
            if !actual.eq_ignore_ascii_case(&expected) {
                return Err(Error::ChecksumMismatch { expected, actual });
            }
        }
        debug!(object = %self.full_name(), "uploaded object");
        Ok(())
    }

    /// Download the object (GET). The response headers replace the cached
    /// headers.
    pub async fn download(&mut self, opts: Option<&RequestOptions>) -> Result<DownloadedObject> {
        let downloaded = self.get(opts).await?;
        self.headers = Some(downloaded.headers.clone());
        Ok(downloaded)
    }

    /// GET without touching the header cache.
    pub(crate) async fn get(&self, opts: Option<&RequestOptions>) -> Result<DownloadedObject> {
        let resp = self
            .request(Method::GET, &[StatusCode::OK, StatusCode::PARTIAL_CONTENT])
            .options(opts)?
            .send(self.account().backend().as_ref())
            .await?;
        let (parts, body) = resp.into_parts();
        Ok(DownloadedObject {
            headers: parse_headers(&parts.headers)?,
            body,
        })
    }

    /// Delete the object.
    ///
    /// With [`DeleteOptions::delete_segments`], a large object's segments
    /// are bulk-deleted once the manifest is gone. A regular object is
    /// deleted as usual.
    pub async fn delete(
        &mut self,
        options: DeleteOptions,
        opts: Option<&RequestOptions>,
    ) -> Result<()> {
        let segments = if options.delete_segments {
            match self.as_large_object().await {
                Ok(lo) => lo.segment_objects(),
                Err(Error::NotLarge) => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        self.request(Method::DELETE, &[StatusCode::NO_CONTENT])
            .options(opts)?
            .send(self.account().backend().as_ref())
            .await?;
        self.invalidate();

        if !segments.is_empty() {
            debug!(object = %self.full_name(), segments = segments.len(), "deleting segments");
            self.account().bulk_delete(&segments, &[], None).await?;
        }
        Ok(())
    }

    /// Drop the cached headers.
    pub fn invalidate(&mut self) {
        self.headers = None;
    }

    /// A temporary URL granting `method` on this object until `expires`.
    ///
    /// `key` is the account's or container's temp URL key. The digest is the
    /// strongest one both the cluster and `allowed_digests` accept (an empty
    /// list accepts any). Fails with [`Error::NotSupported`] if the cluster
    /// has no temp URL middleware or no common digest exists.
    pub async fn temp_url(
        &self,
        key: &str,
        method: Method,
        expires: DateTime<Utc>,
        allowed_digests: &[TempUrlDigest],
    ) -> Result<String> {
        let caps = self.account().capabilities().await?;
        let tempurl = caps.tempurl.ok_or(Error::NotSupported)?;
        let digest = rustwift_auth::choose_digest(&tempurl.digests(), allowed_digests)
            .ok_or(Error::NotSupported)?;

        let url = self.url()?;
        let endpoint: http::Uri = self
            .account()
            .endpoint_url()
            .parse()
            .map_err(|_| Error::InvalidEndpoint(self.account().endpoint_url().to_owned()))?;
        let path = format!("{}{}", endpoint.path(), self.full_name());
        let expires = expires.timestamp();
        let sig = rustwift_auth::sign(digest, key.as_bytes(), method.as_str(), expires, &path);
        Ok(format!("{url}?temp_url_sig={sig}&temp_url_expires={expires}"))
    }
}

fn parse_headers(map: &http::HeaderMap) -> Result<ObjectHeaders> {
    let headers = ObjectHeaders::from_header_map(map);
    headers.validate().map_err(|source| Error::MalformedHeader {
        source,
        headers: headers.clone().into_headers(),
    })?;
    Ok(headers)
}

/// The result of [`Object::download`].
#[derive(Debug)]
pub struct DownloadedObject {
    headers: ObjectHeaders,
    body: Body,
}

impl DownloadedObject {
    /// The response headers.
    #[must_use]
    pub fn headers(&self) -> &ObjectHeaders {
        &self.headers
    }

    /// Read the whole content into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        Ok(self.body.collect().await?)
    }

    /// Read the whole content as UTF-8 text (lossy).
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Stream the content.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, std::io::Result<Bytes>> {
        self.body.into_stream()
    }
}
