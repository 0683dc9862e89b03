//! Streaming writes into a large object.

use bytes::{Bytes, BytesMut};

use super::LargeObject;
use crate::Result;

/// How [`LargeObject::open`] treats the existing segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Bulk-delete the current segment objects and start empty.
    Truncate,
    /// Start empty but leave the old segment objects in place.
    TruncateKeepSegments,
    /// Keep the current segments and add after them.
    Append,
}

/// Writes data into a [`LargeObject`] as a sequence of segments.
///
/// Without a segment size, every [`write`](Self::write) becomes one segment.
/// With [`with_segment_size`](Self::with_segment_size), data is buffered and
/// cut into segments of exactly that size; the remainder is uploaded by
/// [`flush`](Self::flush) or [`close`](Self::close). Closing writes the
/// manifest; dropping the writer does not.
#[derive(Debug)]
pub struct LargeObjectWriter<'a> {
    large_object: &'a mut LargeObject,
    segment_size: usize,
    buffer: BytesMut,
}

impl<'a> LargeObjectWriter<'a> {
    pub(super) fn new(large_object: &'a mut LargeObject) -> Self {
        Self {
            large_object,
            segment_size: 0,
            buffer: BytesMut::new(),
        }
    }

    /// Cut segments at `size` bytes. 0 restores one segment per write.
    #[must_use]
    pub fn with_segment_size(mut self, size: usize) -> Self {
        self.segment_size = size;
        self
    }

    /// The large object being written.
    #[must_use]
    pub fn large_object(&self) -> &LargeObject {
        self.large_object
    }

    /// Write `data`, uploading segments as they fill up. Returns the number
    /// of bytes accepted, which is always `data.len()`.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        if self.segment_size == 0 {
            self.large_object
                .upload_segment(Bytes::copy_from_slice(data))
                .await?;
            return Ok(data.len());
        }

        self.buffer.extend_from_slice(data);
        while self.buffer.len() >= self.segment_size {
            let segment = self.buffer.split_to(self.segment_size).freeze();
            self.large_object.upload_segment(segment).await?;
        }
        Ok(data.len())
    }

    /// Upload buffered data as a (possibly short) segment.
    pub async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let segment = self.buffer.split().freeze();
        self.large_object.upload_segment(segment).await
    }

    /// Flush and write the manifest.
    pub async fn close(mut self) -> Result<()> {
        self.flush().await?;
        self.large_object.write_manifest(None).await
    }
}
