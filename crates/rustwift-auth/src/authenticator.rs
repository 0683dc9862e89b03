//! Credential acquisition.
//!
//! An [`Authenticator`] turns whatever secret the user holds into a token and
//! the storage URL of the account. The HTTP backend calls it once at startup
//! and again whenever Swift answers 401.

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::AuthError;

/// A token and the account endpoint it is valid for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Value for the `X-Auth-Token` header.
    pub token: String,
    /// Account endpoint, e.g. `https://swift.example.com/v1/AUTH_test/`.
    /// Always ends with `/`.
    pub storage_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("storage_url", &self.storage_url)
            .finish()
    }
}

impl Credentials {
    /// Create credentials, appending a trailing `/` to the storage URL if
    /// needed.
    pub fn new(token: impl Into<String>, storage_url: impl Into<String>) -> Self {
        let mut storage_url = storage_url.into();
        if !storage_url.ends_with('/') {
            storage_url.push('/');
        }
        Self {
            token: token.into(),
            storage_url,
        }
    }
}

/// Source of Swift credentials.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Obtain a fresh token.
    async fn authenticate(&self) -> Result<Credentials, AuthError>;
}

/// A pre-issued token that never changes.
///
/// Useful when the token comes from elsewhere (e.g. `OS_AUTH_TOKEN`), and in
/// tests. A 401 with this authenticator cannot be recovered from.
#[derive(Debug, Clone)]
pub struct StaticToken {
    credentials: Credentials,
}

impl StaticToken {
    /// Wrap a token and storage URL.
    pub fn new(token: impl Into<String>, storage_url: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(token, storage_url),
        }
    }
}

#[async_trait]
impl Authenticator for StaticToken {
    async fn authenticate(&self) -> Result<Credentials, AuthError> {
        Ok(self.credentials.clone())
    }
}

/// Swift v1 authentication (`tempauth` / `swauth`): a GET on the auth URL
/// with `X-Auth-User` and `X-Auth-Key` returns the token in `X-Auth-Token`
/// and the account endpoint in `X-Storage-Url`.
#[derive(Clone)]
pub struct SwauthV1 {
    client: reqwest::Client,
    auth_url: String,
    user: String,
    key: String,
}

impl fmt::Debug for SwauthV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwauthV1")
            .field("auth_url", &self.auth_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl SwauthV1 {
    /// Create an authenticator for `auth_url` (e.g.
    /// `http://127.0.0.1:8080/auth/v1.0`).
    pub fn new(auth_url: impl Into<String>, user: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), auth_url, user, key)
    }

    /// Create an authenticator that shares an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        auth_url: impl Into<String>,
        user: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            user: user.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for SwauthV1 {
    async fn authenticate(&self) -> Result<Credentials, AuthError> {
        debug!(auth_url = %self.auth_url, user = %self.user, "requesting Swift v1 token");
        let resp = self
            .client
            .get(&self.auth_url)
            .header("X-Auth-User", &self.user)
            .header("X-Auth-Key", &self.key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Rejected(status));
        }

        let header = |name: &'static str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };
        let token = header("X-Auth-Token")
            .or_else(|| header("X-Storage-Token"))
            .ok_or(AuthError::MissingHeader("X-Auth-Token"))?;
        let storage_url = header("X-Storage-Url").ok_or(AuthError::MissingHeader("X-Storage-Url"))?;
        if !storage_url.starts_with("http://") && !storage_url.starts_with("https://") {
            return Err(AuthError::InvalidStorageUrl(storage_url));
        }

        Ok(Credentials::new(token, storage_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_append_trailing_slash() {
        let creds = Credentials::new("tok", "http://localhost:8080/v1/AUTH_test");
        assert_eq!(creds.storage_url, "http://localhost:8080/v1/AUTH_test/");
        let creds = Credentials::new("tok", "http://localhost:8080/v1/AUTH_test/");
        assert_eq!(creds.storage_url, "http://localhost:8080/v1/AUTH_test/");
    }

    #[test]
    fn test_should_redact_token_in_debug() {
        let creds = Credentials::new("super-secret", "http://x/v1/AUTH_a/");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("AUTH_a"));
    }

    #[tokio::test]
    async fn test_should_return_static_token() {
        let auth = StaticToken::new("tok", "http://x/v1/AUTH_a");
        let creds = auth.authenticate().await.unwrap();
        assert_eq!(creds.token, "tok");
        assert_eq!(creds.storage_url, "http://x/v1/AUTH_a/");
    }
}
