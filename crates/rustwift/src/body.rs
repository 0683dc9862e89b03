//! Request and response bodies.
//!
//! A [`Body`] is either empty, a fully buffered [`Bytes`] value, or a boxed
//! stream of chunks. Buffered bodies can be replayed (for the retry after a
//! 401) and hashed before they are sent; streamed bodies are hashed on the
//! fly.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// An HTTP body exchanged with a [`Backend`](crate::backend::Backend).
#[derive(Default)]
pub enum Body {
    /// No content.
    #[default]
    Empty,
    /// Content held entirely in memory.
    Bytes(Bytes),
    /// Content produced incrementally.
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Bytes(b) => write!(f, "Body::Bytes({} bytes)", b.len()),
            Self::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl Body {
    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Wrap a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// Read the body from an [`AsyncRead`] source.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::from_stream(ReaderStream::new(reader))
    }

    /// The in-memory content, if the body is not a stream.
    #[must_use]
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Empty => Some(Bytes::new()),
            Self::Bytes(b) => Some(b.clone()),
            Self::Stream(_) => None,
        }
    }

    /// A copy of this body, if it can be sent more than once.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            Self::Empty => Some(Self::Empty),
            Self::Bytes(b) => Some(Self::Bytes(b.clone())),
            Self::Stream(_) => None,
        }
    }

    /// Whether the body is known to be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(b) => b.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> io::Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Bytes(b) => Ok(b),
            Self::Stream(s) => {
                let buf = s
                    .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                        acc.extend_from_slice(&chunk);
                        Ok(acc)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }

    /// Read and discard the whole body.
    pub async fn drain(self) -> io::Result<()> {
        if let Self::Stream(mut s) = self {
            while let Some(chunk) = s.next().await {
                chunk?;
            }
        }
        Ok(())
    }

    /// Convert into a stream of chunks.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        match self {
            Self::Empty => stream::empty().boxed(),
            Self::Bytes(b) => stream::once(async move { Ok(b) }).boxed(),
            Self::Stream(s) => s,
        }
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Bytes(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_should_collect_stream_body() {
        let chunks = vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))];
        let body = Body::from_stream(stream::iter(chunks));
        assert!(body.try_clone().is_none());
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_should_read_from_async_reader() {
        let body = Body::from_reader(&b"from a reader"[..]);
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"from a reader"));
    }

    #[tokio::test]
    async fn test_should_surface_stream_errors_on_drain() {
        let chunks = vec![Ok(Bytes::from_static(b"x")), Err(io::Error::other("boom"))];
        let body = Body::from_stream(stream::iter(chunks));
        assert!(body.drain().await.is_err());
    }

    #[test]
    fn test_should_clone_buffered_bodies() {
        let body = Body::from("abc");
        assert_eq!(body.as_bytes(), Some(Bytes::from_static(b"abc")));
        assert!(body.try_clone().is_some());
        assert!(Body::empty().is_empty());
    }
}
