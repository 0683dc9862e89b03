//! Header errors.

/// Errors produced by the header model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// A well-known header carries a value that does not parse as its type.
    #[error("malformed value for header {key}: {reason}")]
    Malformed {
        /// The canonical header name.
        key: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A header name cannot be sent over HTTP.
    #[error("invalid header name: {0}")]
    InvalidName(String),

    /// A header value cannot be sent over HTTP.
    #[error("invalid value for header {0}")]
    InvalidValue(String),
}
