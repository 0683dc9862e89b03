//! Large objects: objects whose content is the concatenation of segments.
//!
//! Swift offers two flavors, both handled by [`LargeObject`]:
//!
//! - **Static** (SLO): a JSON manifest lists every segment explicitly, with
//!   optional size, Etag and byte range, or inline data.
//! - **Dynamic** (DLO): the manifest names a container and a prefix; the
//!   content is every object below that prefix, in name order.
//!
//! A [`LargeObject`] is a local working copy. Segments are uploaded and added
//! as needed, then [`LargeObject::write_manifest`] publishes the result.
//! Adding segments makes no request of its own.
//!
//! # Examples
//!
//! ```
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//!
//! use rustwift::Account;
//! use rustwift::backend::MemoryBackend;
//! use rustwift::large_object::{SegmentingOptions, TruncateOptions};
//!
//! let account = Account::new(Arc::new(MemoryBackend::new())).unwrap();
//! let mut segments = account.container("segments");
//! segments.ensure_exists().await.unwrap();
//! account.container("media").ensure_exists().await.unwrap();
//!
//! let mut object = account.container("media").object("movie.mp4");
//! let mut lo = object
//!     .as_new_large_object(
//!         SegmentingOptions {
//!             segment_container: Some(segments),
//!             segment_prefix: "movie/".to_owned(),
//!             ..Default::default()
//!         },
//!         TruncateOptions::default(),
//!     )
//!     .await
//!     .unwrap();
//! lo.append(&b"0123456789"[..], 4).await.unwrap();
//! lo.write_manifest(None).await.unwrap();
//!
//! let content = object.download(None).await.unwrap().bytes().await.unwrap();
//! assert_eq!(&content[..], b"0123456789");
//! # });
//! ```

mod manifest;
mod naming;
mod segment;
mod writer;

use bytes::Bytes;
use rustwift_headers::ObjectHeaders;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use self::manifest::{ManifestRecord, infer_location};
use self::naming::{first_segment_name, next_segment_name};
pub use self::segment::{ObjectSegment, SegmentInfo, SegmentRange};
pub use self::writer::{LargeObjectWriter, OpenMode};
use crate::request::RequestOptions;
use crate::{Body, Container, Error, Object, Result};

/// How a large object's manifest is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LargeObjectStrategy {
    /// Static large object: explicit JSON manifest.
    #[default]
    Static,
    /// Dynamic large object: `X-Object-Manifest: container/prefix`.
    Dynamic,
}

/// Where new segments go, for [`Object::as_new_large_object`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentingOptions {
    /// Container receiving new segments. Required; must be in the same
    /// account as the large object.
    pub segment_container: Option<Container>,
    /// Prefix of new segment names.
    pub segment_prefix: String,
    /// Manifest flavor.
    pub strategy: LargeObjectStrategy,
}

/// What happens to an existing object's segments in
/// [`Object::as_new_large_object`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruncateOptions {
    /// Keep the old segment objects instead of deleting them.
    pub keep_segments: bool,
}

/// A working copy of a large object's segment list.
#[derive(Debug, Clone)]
pub struct LargeObject {
    object: Object,
    segment_container: Option<Container>,
    segment_prefix: String,
    strategy: LargeObjectStrategy,
    segments: Vec<SegmentInfo>,
}

impl LargeObject {
    fn empty(object: Object) -> Self {
        Self {
            object,
            segment_container: None,
            segment_prefix: String::new(),
            strategy: LargeObjectStrategy::Static,
            segments: Vec::new(),
        }
    }

    /// The object holding the manifest.
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Mutable access to the manifest object, e.g. to refresh its headers.
    pub fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    /// Container receiving new segments.
    #[must_use]
    pub fn segment_container(&self) -> Option<&Container> {
        self.segment_container.as_ref()
    }

    /// Change the container receiving new segments.
    pub fn set_segment_container(&mut self, container: Container) {
        self.segment_container = Some(container);
    }

    /// Prefix of new segment names.
    #[must_use]
    pub fn segment_prefix(&self) -> &str {
        &self.segment_prefix
    }

    /// Change the prefix of new segment names.
    pub fn set_segment_prefix(&mut self, prefix: impl Into<String>) {
        self.segment_prefix = prefix.into();
    }

    /// Manifest flavor.
    #[must_use]
    pub fn strategy(&self) -> LargeObjectStrategy {
        self.strategy
    }

    /// Change the manifest flavor. Takes effect on the next
    /// [`write_manifest`](Self::write_manifest).
    pub fn set_strategy(&mut self, strategy: LargeObjectStrategy) {
        self.strategy = strategy;
    }

    /// The current segment list.
    #[must_use]
    pub fn segments(&self) -> &[SegmentInfo] {
        &self.segments
    }

    /// Distinct objects referenced by the segment list, in order of first
    /// reference.
    #[must_use]
    pub fn segment_objects(&self) -> Vec<Object> {
        let mut objects: Vec<Object> = Vec::new();
        for object in self.segments.iter().filter_map(SegmentInfo::object) {
            if !objects.contains(object) {
                objects.push(object.clone());
            }
        }
        objects
    }

    /// The object the next uploaded segment will be written to: the
    /// successor of the last segment in the segment container below the
    /// segment prefix.
    pub fn next_segment_object(&self) -> Result<Object> {
        let container = self.segment_container.as_ref().ok_or(Error::NoContainerName)?;
        let last = self
            .segments
            .iter()
            .rev()
            .filter_map(SegmentInfo::object)
            .find(|o| o.container() == container && o.name().starts_with(&self.segment_prefix));
        let name = match last {
            Some(object) => next_segment_name(object.name()),
            None => first_segment_name(&self.segment_prefix),
        };
        Ok(container.object(name))
    }

    /// Add an existing segment at the end. No request is made.
    ///
    /// Object segments must be in the large object's account. For dynamic
    /// large objects they must also sit in the segment container below the
    /// segment prefix and cover the whole object; inline data is only
    /// allowed in static large objects.
    pub fn add_segment(&mut self, segment: impl Into<SegmentInfo>) -> Result<()> {
        let segment = segment.into();
        let dynamic = self.strategy == LargeObjectStrategy::Dynamic;
        match &segment {
            SegmentInfo::Data(data) => {
                if dynamic {
                    return Err(Error::SegmentInvalid(
                        "inline data requires a static large object",
                    ));
                }
                if data.is_empty() {
                    return Err(Error::SegmentInvalid("inline data segment is empty"));
                }
            }
            SegmentInfo::Object(seg) => {
                if seg.object.account() != self.object.account() {
                    return Err(Error::AccountMismatch);
                }
                if dynamic {
                    if !seg.range.is_full() {
                        return Err(Error::SegmentInvalid(
                            "dynamic large objects do not support ranges",
                        ));
                    }
                    let in_container = self
                        .segment_container
                        .as_ref()
                        .is_some_and(|c| c == seg.object.container());
                    if !in_container || !seg.object.name().starts_with(&self.segment_prefix) {
                        return Err(Error::ContainerMismatch);
                    }
                } else if seg.range.offset() < 0 && seg.range.length() == 0 {
                    return Err(Error::SegmentInvalid("suffix range without length"));
                }
            }
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Upload `data` as the next segment object and add it.
    pub(crate) async fn upload_segment(&mut self, data: Bytes) -> Result<()> {
        self.check_writable()?;
        let mut object = self.next_segment_object()?;
        let etag = crate::checksums::compute_md5(&data);
        let size = data.len() as u64;
        let mut headers = ObjectHeaders::new();
        headers.etag_mut().set(etag.clone());
        object.upload(Body::from(data), &headers, None).await?;
        debug!(segment = %object.full_name(), size, "uploaded segment");
        self.add_segment(ObjectSegment {
            object,
            size_bytes: Some(size),
            etag: Some(etag),
            range: SegmentRange::full(),
        })
    }

    fn check_writable(&self) -> Result<()> {
        let container = self.segment_container.as_ref().ok_or(Error::NoContainerName)?;
        if container.account() != self.object.account() {
            return Err(Error::AccountMismatch);
        }
        Ok(())
    }

    /// Read `reader` to the end, uploading a new segment for every
    /// `chunk_size` bytes (the last one may be shorter). A `chunk_size` of 0
    /// uploads everything as one segment. Returns the number of bytes read.
    ///
    /// The manifest is not written.
    pub async fn append<R>(&mut self, reader: R, chunk_size: usize) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        self.check_writable()?;
        let mut reader = reader;
        let mut total = 0u64;
        loop {
            let mut chunk = Vec::with_capacity(chunk_size);
            if chunk_size == 0 {
                reader.read_to_end(&mut chunk).await?;
            } else {
                (&mut reader).take(chunk_size as u64).read_to_end(&mut chunk).await?;
            }
            if chunk.is_empty() {
                break;
            }
            total += chunk.len() as u64;
            self.upload_segment(Bytes::from(chunk)).await?;
            if chunk_size == 0 {
                break;
            }
        }
        Ok(total)
    }

    /// Drop all segments from the list, optionally bulk-deleting the segment
    /// objects. The manifest is not written.
    pub async fn truncate(&mut self, delete_segments: bool) -> Result<()> {
        if delete_segments {
            let objects = self.segment_objects();
            if !objects.is_empty() {
                debug!(object = %self.object.full_name(), count = objects.len(), "deleting segments");
                self.object.account().bulk_delete(&objects, &[], None).await?;
            }
        }
        self.segments.clear();
        Ok(())
    }

    /// Publish the segment list as the object's manifest.
    pub async fn write_manifest(&mut self, opts: Option<&RequestOptions>) -> Result<()> {
        match self.strategy {
            LargeObjectStrategy::Static => self.write_static_manifest(opts).await,
            LargeObjectStrategy::Dynamic => self.write_dynamic_manifest(opts).await,
        }
    }

    async fn write_static_manifest(&mut self, opts: Option<&RequestOptions>) -> Result<()> {
        let records: Vec<ManifestRecord> =
            self.segments.iter().map(ManifestRecord::from_segment).collect();
        let body = serde_json::to_vec(&records)?;

        let mut opts = opts.cloned().unwrap_or_default();
        opts.headers.del("X-Object-Manifest");
        opts.values.insert("multipart-manifest".to_owned(), "put".to_owned());

        debug!(object = %self.object.full_name(), segments = records.len(), "writing SLO manifest");
        self.object
            .put(Body::from(body), ObjectHeaders::new(), Some(&opts), false)
            .await
    }

    async fn write_dynamic_manifest(&mut self, opts: Option<&RequestOptions>) -> Result<()> {
        self.check_writable()?;
        let container = self.segment_container.as_ref().ok_or(Error::NoContainerName)?;
        let manifest = format!("{}/{}", container.name(), self.segment_prefix);

        let current = match self.object.headers().await {
            Ok(headers) => headers.large_object_manifest().get(),
            Err(e) if e.is_status(http::StatusCode::NOT_FOUND) => None,
            Err(e) => return Err(e),
        };
        if current.as_deref() == Some(manifest.as_str()) {
            return Ok(());
        }

        let mut headers = ObjectHeaders::new();
        headers.large_object_manifest_mut().set(manifest.clone());
        debug!(object = %self.object.full_name(), manifest = %manifest, "writing DLO manifest");
        self.object.put(Body::Empty, headers, opts, true).await
    }

    /// Open a streaming writer that turns every write into segments.
    ///
    /// [`OpenMode::Truncate`] deletes the current segment objects first,
    /// [`OpenMode::TruncateKeepSegments`] only forgets them and
    /// [`OpenMode::Append`] keeps them.
    pub async fn open(&mut self, mode: OpenMode) -> Result<LargeObjectWriter<'_>> {
        self.check_writable()?;
        match mode {
            OpenMode::Truncate => self.truncate(true).await?,
            OpenMode::TruncateKeepSegments => self.truncate(false).await?,
            OpenMode::Append => {}
        }
        Ok(LargeObjectWriter::new(self))
    }
}

impl Object {
    /// Load the segment list of an existing large object.
    ///
    /// An object that does not exist yields an empty static large object
    /// without segment container. A regular object fails with
    /// [`Error::NotLarge`].
    pub async fn as_large_object(&mut self) -> Result<LargeObject> {
        if !self.exists().await? {
            return Ok(LargeObject::empty(self.clone()));
        }
        let headers = self.headers().await?;
        if let Some(manifest) = headers.large_object_manifest().get() {
            self.as_dynamic_large_object(&manifest).await
        } else if headers.is_static_large_object() {
            self.as_static_large_object().await
        } else {
            Err(Error::NotLarge)
        }
    }

    async fn as_dynamic_large_object(&self, manifest: &str) -> Result<LargeObject> {
        let (container, prefix) = manifest.split_once('/').ok_or(Error::NotLarge)?;
        let container = self.account().container(container);
        let infos = container.objects().with_prefix(prefix).collect_detailed().await?;

        let mut lo = LargeObject::empty(self.clone());
        lo.strategy = LargeObjectStrategy::Dynamic;
        lo.segment_prefix = prefix.to_owned();
        lo.segments = infos
            .into_iter()
            .filter(|info| !info.is_subdirectory)
            .map(|info| {
                SegmentInfo::Object(ObjectSegment {
                    object: info.object,
                    size_bytes: Some(info.size_bytes),
                    etag: Some(info.etag),
                    range: SegmentRange::full(),
                })
            })
            .collect();
        lo.segment_container = Some(container);
        Ok(lo)
    }

    async fn as_static_large_object(&self) -> Result<LargeObject> {
        let opts = RequestOptions::new()
            .with_value("multipart-manifest", "get")
            .with_value("format", "raw");
        let body = self.get(Some(&opts)).await?.bytes().await?;
        let records: Vec<ManifestRecord> = serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidManifest(e.to_string()))?;

        let mut lo = LargeObject::empty(self.clone());
        lo.segments = records
            .into_iter()
            .map(|r| r.into_segment(self.account()))
            .collect::<Result<_>>()?;
        if let Some((container, prefix)) = infer_location(&lo.segments) {
            lo.segment_container = Some(self.account().container(container));
            lo.segment_prefix = prefix;
        }
        Ok(lo)
    }

    /// Start a new large object at this object's name.
    ///
    /// If a large object exists here, its segments are deleted unless
    /// `truncate.keep_segments` is set. The manifest is not written until
    /// [`LargeObject::write_manifest`].
    pub async fn as_new_large_object(
        &mut self,
        segmenting: SegmentingOptions,
        truncate: TruncateOptions,
    ) -> Result<LargeObject> {
        let container = segmenting.segment_container.ok_or(Error::NoContainerName)?;
        if container.account() != self.account() {
            return Err(Error::AccountMismatch);
        }
        let mut lo = match self.as_large_object().await {
            Ok(lo) => lo,
            Err(Error::NotLarge) => LargeObject::empty(self.clone()),
            Err(e) => return Err(e),
        };
        lo.truncate(!truncate.keep_segments).await?;
        lo.segment_container = Some(container);
        lo.segment_prefix = segmenting.segment_prefix;
        lo.strategy = segmenting.strategy;
        Ok(lo)
    }
}

#[cfg(test)]
mod tests;
