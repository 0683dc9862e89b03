//! Paginated account and container listings.
//!
//! Listings are requested as JSON, `limit` entries at a time. The last name
//! of each page becomes the `marker` of the next request; an empty page ends
//! the listing.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use http::{Method, StatusCode};
use serde::Deserialize;

use crate::request::Request;
use crate::{Account, Container, Object, Result};

/// Page size used by the `collect` and `for_each` helpers.
const DEFAULT_PAGE_SIZE: usize = 10_000;

/// A container as reported by an account listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    /// Handle to the container.
    pub container: Container,
    /// Number of objects.
    pub object_count: u64,
    /// Total bytes stored.
    pub bytes_used: u64,
    /// Time of the last change, if reported.
    pub last_modified: Option<DateTime<Utc>>,
}

/// An object (or pseudo-directory) as reported by a container listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    /// Handle to the object. For a pseudo-directory, its name is the
    /// directory prefix.
    pub object: Object,
    /// Whether this entry is a pseudo-directory produced by a delimiter.
    pub is_subdirectory: bool,
    /// Content length in bytes.
    pub size_bytes: u64,
    /// MD5 hex digest of the content.
    pub etag: String,
    /// MIME type.
    pub content_type: String,
    /// Time of the last change, if reported.
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ContainerEntry {
    name: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    last_modified: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ObjectEntry {
    Subdir {
        subdir: String,
    },
    Object {
        name: String,
        #[serde(default)]
        bytes: u64,
        #[serde(default)]
        hash: String,
        #[serde(default)]
        content_type: String,
        #[serde(default)]
        last_modified: Option<String>,
    },
}

impl ObjectEntry {
    fn name(&self) -> &str {
        match self {
            Self::Subdir { subdir } => subdir,
            Self::Object { name, .. } => name,
        }
    }
}

fn parse_last_modified(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}

/// Shared pagination state.
#[derive(Debug, Clone, Default)]
struct Cursor {
    prefix: String,
    delimiter: String,
    marker: String,
    eof: bool,
}

impl Cursor {
    async fn fetch(
        &self,
        account: &Account,
        container: Option<&str>,
        limit: usize,
    ) -> Result<Bytes> {
        let mut req = Request::new(Method::GET, &[StatusCode::OK, StatusCode::NO_CONTENT])
            .value("format", "json")
            .value("limit", limit.to_string());
        if let Some(container) = container {
            req = req.container(container);
        }
        if !self.prefix.is_empty() {
            req = req.value("prefix", self.prefix.clone());
        }
        if !self.delimiter.is_empty() {
            req = req.value("delimiter", self.delimiter.clone());
        }
        if !self.marker.is_empty() {
            req = req.value("marker", self.marker.clone());
        }
        let resp = req.send(account.backend().as_ref()).await?;
        Ok(resp.into_body().collect().await?)
    }

    fn advance(&mut self, last: Option<&str>) {
        match last {
            Some(name) => self.marker = name.to_owned(),
            None => self.eof = true,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<Vec<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(body)?)
}

// ---------------------------------------------------------------------------
// ContainerIterator
// ---------------------------------------------------------------------------

/// Iterates over the containers of an account.
///
/// Obtained from [`Account::containers`].
#[derive(Debug)]
pub struct ContainerIterator<'a> {
    account: &'a Account,
    cursor: Cursor,
}

impl<'a> ContainerIterator<'a> {
    pub(crate) fn new(account: &'a Account) -> Self {
        Self {
            account,
            cursor: Cursor::default(),
        }
    }

    /// Only list containers whose name starts with `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cursor.prefix = prefix.into();
        self
    }

    /// The next page of at most `limit` containers. Empty once exhausted.
    pub async fn next_page(&mut self, limit: usize) -> Result<Vec<Container>> {
        let page = self.next_page_detailed(limit).await?;
        Ok(page.into_iter().map(|info| info.container).collect())
    }

    /// Like [`next_page`](Self::next_page), with listing details.
    pub async fn next_page_detailed(&mut self, limit: usize) -> Result<Vec<ContainerInfo>> {
        if self.cursor.eof {
            return Ok(Vec::new());
        }
        let body = self.cursor.fetch(self.account, None, limit).await?;
        let entries: Vec<ContainerEntry> = decode(&body)?;
        self.cursor.advance(entries.last().map(|e| e.name.as_str()));
        Ok(entries
            .into_iter()
            .map(|e| ContainerInfo {
                container: self.account.container(e.name),
                object_count: e.count,
                bytes_used: e.bytes,
                last_modified: parse_last_modified(e.last_modified.as_deref()),
            })
            .collect())
    }

    /// All remaining containers.
    pub async fn collect(self) -> Result<Vec<Container>> {
        let infos = self.collect_detailed().await?;
        Ok(infos.into_iter().map(|info| info.container).collect())
    }

    /// All remaining containers, with listing details.
    pub async fn collect_detailed(mut self) -> Result<Vec<ContainerInfo>> {
        let mut out = Vec::new();
        loop {
            let page = self.next_page_detailed(DEFAULT_PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(out);
            }
            out.extend(page);
        }
    }

    /// Call `f` for each remaining container, stopping at the first error.
    pub async fn for_each<F>(mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Container) -> Result<()>,
    {
        loop {
            let page = self.next_page(DEFAULT_PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(());
            }
            page.into_iter().try_for_each(&mut f)?;
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectIterator
// ---------------------------------------------------------------------------

/// Iterates over the objects of a container.
///
/// Obtained from [`Container::objects`].
#[derive(Debug)]
pub struct ObjectIterator<'a> {
    container: &'a Container,
    cursor: Cursor,
}

impl<'a> ObjectIterator<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self {
            container,
            cursor: Cursor::default(),
        }
    }

    /// Only list objects whose name starts with `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cursor.prefix = prefix.into();
        self
    }

    /// Roll up names containing `delimiter` after the prefix into
    /// pseudo-directory entries.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.cursor.delimiter = delimiter.into();
        self
    }

    /// The next page of at most `limit` objects. Empty once exhausted.
    pub async fn next_page(&mut self, limit: usize) -> Result<Vec<Object>> {
        let page = self.next_page_detailed(limit).await?;
        Ok(page.into_iter().map(|info| info.object).collect())
    }

    /// Like [`next_page`](Self::next_page), with listing details.
    pub async fn next_page_detailed(&mut self, limit: usize) -> Result<Vec<ObjectInfo>> {
        if self.cursor.eof {
            return Ok(Vec::new());
        }
        let account = self.container.account();
        let body = self
            .cursor
            .fetch(account, Some(self.container.name()), limit)
            .await?;
        let entries: Vec<ObjectEntry> = decode(&body)?;
        self.cursor.advance(entries.last().map(ObjectEntry::name));
        Ok(entries
            .into_iter()
            .map(|e| match e {
                ObjectEntry::Subdir { subdir } => ObjectInfo {
                    object: self.container.object(subdir),
                    is_subdirectory: true,
                    size_bytes: 0,
                    etag: String::new(),
                    content_type: String::new(),
                    last_modified: None,
                },
                ObjectEntry::Object {
                    name,
                    bytes,
                    hash,
                    content_type,
                    last_modified,
                } => ObjectInfo {
                    object: self.container.object(name),
                    is_subdirectory: false,
                    size_bytes: bytes,
                    etag: hash,
                    content_type,
                    last_modified: parse_last_modified(last_modified.as_deref()),
                },
            })
            .collect())
    }

    /// All remaining objects.
    pub async fn collect(self) -> Result<Vec<Object>> {
        let infos = self.collect_detailed().await?;
        Ok(infos.into_iter().map(|info| info.object).collect())
    }

    /// All remaining objects, with listing details.
    pub async fn collect_detailed(mut self) -> Result<Vec<ObjectInfo>> {
        let mut out = Vec::new();
        loop {
            let page = self.next_page_detailed(DEFAULT_PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(out);
            }
            out.extend(page);
        }
    }

    /// Call `f` for each remaining object, stopping at the first error.
    pub async fn for_each<F>(mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Object) -> Result<()>,
    {
        loop {
            let page = self.next_page(DEFAULT_PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(());
            }
            page.into_iter().try_for_each(&mut f)?;
        }
    }

    /// Call `f` for each remaining object with listing details.
    pub async fn for_each_detailed<F>(mut self, mut f: F) -> Result<()>
    where
        F: FnMut(ObjectInfo) -> Result<()>,
    {
        loop {
            let page = self.next_page_detailed(DEFAULT_PAGE_SIZE).await?;
            if page.is_empty() {
                return Ok(());
            }
            page.into_iter().try_for_each(&mut f)?;
        }
    }
}
