//! Error types for Swift operations.
//!
//! Defines [`Error`], covering every failure a Swift operation can report,
//! and the [`BulkError`] aggregate returned by bulk operations. Errors keep
//! the server's answer intact: [`Error::UnexpectedStatus`] carries the status
//! code, response headers and body verbatim.
//!
//! # Usage
//!
//! ```
//! use http::StatusCode;
//! use rustwift::Error;
//!
//! let err = Error::UnexpectedStatus {
//!     expected: vec![StatusCode::NO_CONTENT],
//!     status: StatusCode::CONFLICT,
//!     headers: http::HeaderMap::new(),
//!     body: bytes::Bytes::from_static(b"container not empty"),
//! };
//! assert!(err.is_status(StatusCode::CONFLICT));
//! assert_eq!(
//!     err.to_string(),
//!     "expected 204 response, got 409 instead: container not empty"
//! );
//! ```

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use rustwift_auth::AuthError;
use rustwift_headers::{HeaderError, Headers};

/// Result alias for Swift operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by Swift operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // -----------------------------------------------------------------------
    // Transport and protocol
    // -----------------------------------------------------------------------
    /// The HTTP request could not be sent or its response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Obtaining a token failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Swift answered with a status code outside the expected set.
    #[error("expected {} response, got {} instead{}", join_codes(.expected), .status.as_u16(), body_suffix(.body))]
    UnexpectedStatus {
        /// The status codes that would have meant success.
        expected: Vec<StatusCode>,
        /// The status code Swift returned.
        status: StatusCode,
        /// The response headers.
        headers: HeaderMap,
        /// The response body.
        body: Bytes,
    },

    /// A well-known header in a response does not parse. The partially
    /// parsed headers are kept for inspection.
    #[error("bad header in response: {source}")]
    MalformedHeader {
        /// The parse failure.
        source: HeaderError,
        /// Every header of the response.
        headers: Headers,
    },

    /// A header given by the caller cannot be put on the wire.
    #[error("invalid request header: {0}")]
    InvalidHeader(HeaderError),

    /// The account endpoint is not of the form `<base>/v1/<account>/`.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Reading a request or response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document from Swift could not be decoded.
    #[error("invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),

    // -----------------------------------------------------------------------
    // Request validation
    // -----------------------------------------------------------------------
    /// An object name was given without a container name, or a large object
    /// has no segment container.
    #[error("missing container name")]
    NoContainerName,

    /// A container name contains a slash.
    #[error("container name may not contain slashes")]
    MalformedContainerName,

    // -----------------------------------------------------------------------
    // Object and large object
    // -----------------------------------------------------------------------
    /// The Etag returned by Swift does not match the uploaded data.
    #[error("Etag on uploaded object does not match MD5 checksum of uploaded data")]
    ChecksumMismatch {
        /// MD5 of the data that was sent.
        expected: String,
        /// Etag reported by Swift.
        actual: String,
    },

    /// The object is neither a static nor a dynamic large object.
    #[error("not a large object")]
    NotLarge,

    /// A segment lives in a different account than the large object.
    #[error("segment is in a different account than the large object")]
    AccountMismatch,

    /// A dynamic large object segment lies outside the segment container or
    /// prefix.
    #[error("segment is not in the segment container below the segment prefix")]
    ContainerMismatch,

    /// A segment descriptor is inconsistent or not allowed for the strategy.
    #[error("invalid segment: {0}")]
    SegmentInvalid(&'static str),

    /// An SLO manifest read from Swift cannot be interpreted.
    #[error("invalid SLO manifest: {0}")]
    InvalidManifest(String),

    // -----------------------------------------------------------------------
    // Capabilities and bulk operations
    // -----------------------------------------------------------------------
    /// The server does not offer a feature this operation needs.
    #[error("operation not supported by this Swift server")]
    NotSupported,

    /// A bulk operation failed completely or partially.
    #[error(transparent)]
    Bulk(#[from] BulkError),
}

impl Error {
    /// Whether this is an [`Error::UnexpectedStatus`] with the given code.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::StatusCode;
    /// use rustwift::Error;
    ///
    /// assert!(!Error::NotLarge.is_status(StatusCode::NOT_FOUND));
    /// ```
    #[must_use]
    pub fn is_status(&self, code: StatusCode) -> bool {
        matches!(self, Self::UnexpectedStatus { status, .. } if *status == code)
    }

    /// The HTTP status code, if this error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn join_codes(codes: &[StatusCode]) -> String {
    codes
        .iter()
        .map(|c| c.as_u16().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn body_suffix(body: &Bytes) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", String::from_utf8_lossy(body))
    }
}

// ---------------------------------------------------------------------------
// BulkError
// ---------------------------------------------------------------------------

/// One failed item of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkObjectError {
    /// Container of the failed item.
    pub container_name: String,
    /// Object of the failed item (empty when a container failed).
    pub object_name: String,
    /// Per-item HTTP status.
    pub status_code: StatusCode,
}

impl fmt::Display for BulkObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.object_name.is_empty() {
            write!(f, "{}: {}", self.container_name, self.status_code)
        } else {
            write!(
                f,
                "{}/{}: {}",
                self.container_name, self.object_name, self.status_code
            )
        }
    }
}

/// Aggregated result of a bulk upload or bulk delete that did not fully
/// succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkError {
    /// Overall status reported in the bulk response.
    pub status_code: StatusCode,
    /// Overall error message (may be empty).
    pub overall_error: String,
    /// Items that failed individually.
    pub object_errors: Vec<BulkObjectError>,
    /// Items that succeeded.
    pub succeeded: u64,
}

impl fmt::Display for BulkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bulk operation returned {}", self.status_code)?;
        if !self.overall_error.is_empty() {
            write!(f, " ({})", self.overall_error)?;
        }
        if !self.object_errors.is_empty() {
            let items: Vec<String> = self.object_errors.iter().map(ToString::to_string).collect();
            write!(f, ", failed items: {}", items.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for BulkError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_format_unexpected_status_without_body() {
        let err = Error::UnexpectedStatus {
            expected: vec![StatusCode::CREATED, StatusCode::ACCEPTED],
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert_eq!(err.to_string(), "expected 201/202 response, got 404 instead");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.is_status(StatusCode::NOT_FOUND));
        assert!(!err.is_status(StatusCode::CONFLICT));
    }

    #[test]
    fn test_should_format_bulk_error() {
        let err = BulkError {
            status_code: StatusCode::BAD_REQUEST,
            overall_error: "Invalid Tar File".to_owned(),
            object_errors: vec![
                BulkObjectError {
                    container_name: "c".to_owned(),
                    object_name: "o".to_owned(),
                    status_code: StatusCode::UNAUTHORIZED,
                },
                BulkObjectError {
                    container_name: "d".to_owned(),
                    object_name: String::new(),
                    status_code: StatusCode::CONFLICT,
                },
            ],
            succeeded: 3,
        };
        assert_eq!(
            err.to_string(),
            "bulk operation returned 400 Bad Request (Invalid Tar File), failed items: c/o: 401 \
             Unauthorized, d: 409 Conflict"
        );
    }
}
