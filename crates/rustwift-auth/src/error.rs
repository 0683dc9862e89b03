//! Error types for authentication and signing.

/// Errors that can occur while obtaining credentials or signing URLs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The auth endpoint could not be reached.
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth endpoint rejected the credentials or failed.
    #[error("auth endpoint returned status {0}")]
    Rejected(http::StatusCode),

    /// The auth response lacks a required header.
    #[error("auth response is missing header {0}")]
    MissingHeader(&'static str),

    /// The storage URL reported by the auth endpoint is unusable.
    #[error("invalid storage URL: {0}")]
    InvalidStorageUrl(String),

    /// The digest name is not one Swift supports for temporary URLs.
    #[error("unsupported temp URL digest: {0}")]
    UnsupportedDigest(String),
}
