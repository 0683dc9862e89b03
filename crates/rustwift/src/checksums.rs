//! MD5 helpers for object Etags.
//!
//! Swift reports the hex MD5 of an object's content as its `Etag`. Uploads
//! either compute that digest up front (for buffered bodies) or while the body
//! streams out, using [`HashingStream`].

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use digest::Digest;
use futures::Stream;
use parking_lot::Mutex;
use pin_project_lite::pin_project;

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use rustwift::checksums::compute_md5;
///
/// assert_eq!(compute_md5(b"hello"), "5d41402abc4b2a76b9719d911017c592");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    hex::encode(md5::Md5::digest(data))
}

/// Compute the Etag Swift reports for a static large object: the quoted MD5
/// of the concatenated segment Etags.
#[must_use]
pub fn compute_slo_etag<'a>(segment_etags: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = md5::Md5::new();
    for etag in segment_etags {
        hasher.update(etag.trim_matches('"').as_bytes());
    }
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Result produced by [`StreamingHasher::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherResult {
    /// Hex-encoded MD5 digest.
    pub md5_hex: String,
    /// Number of bytes hashed.
    pub size: u64,
}

/// Incremental MD5 hasher that also counts bytes.
///
/// # Examples
///
/// ```
/// use rustwift::checksums::StreamingHasher;
///
/// let mut hasher = StreamingHasher::new();
/// hasher.update(b"hel");
/// hasher.update(b"lo");
/// let result = hasher.finish();
/// assert_eq!(result.md5_hex, "5d41402abc4b2a76b9719d911017c592");
/// assert_eq!(result.size, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamingHasher {
    md5: md5::Md5,
    size: u64,
}

impl StreamingHasher {
    /// Create a fresh hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of data.
    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.md5, data);
        self.size += data.len() as u64;
    }

    /// Finish hashing and return the digest.
    #[must_use]
    pub fn finish(self) -> HasherResult {
        HasherResult {
            md5_hex: hex::encode(self.md5.finalize()),
            size: self.size,
        }
    }
}

/// Shared handle to the hasher of a [`HashingStream`], used to read the
/// digest after the stream has been consumed by someone else.
#[derive(Debug, Clone, Default)]
pub struct HashHandle(Arc<Mutex<StreamingHasher>>);

impl HashHandle {
    /// Digest of everything that passed through the stream so far.
    #[must_use]
    pub fn result(&self) -> HasherResult {
        self.0.lock().clone().finish()
    }
}

pin_project! {
    /// A stream adapter that hashes every chunk passing through it.
    pub struct HashingStream<S> {
        #[pin]
        inner: S,
        hasher: HashHandle,
    }
}

impl<S> std::fmt::Debug for HashingStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingStream")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl<S> HashingStream<S> {
    /// Wrap `inner`, returning the stream and a handle to its digest.
    pub fn new(inner: S) -> (Self, HashHandle) {
        let hasher = HashHandle::default();
        (
            Self {
                inner,
                hasher: hasher.clone(),
            },
            hasher,
        )
    }
}

impl<S> Stream for HashingStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.hasher.0.lock().update(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
