//! The transport seam between handles and Swift.
//!
//! A [`Backend`] knows the account endpoint, adds credentials to every
//! request and recovers from an expired token by re-authenticating once.
//! Two implementations ship with the crate:
//!
//! - [`HttpBackend`]: talks to a real Swift cluster through `reqwest`.
//! - [`MemoryBackend`]: an in-process emulation of the Swift API subset this
//!   crate uses, for tests and local development.

mod http;
mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use self::http::{HttpBackend, HttpBackendConfig};
pub use self::memory::{MemoryBackend, MemoryBackendConfig};
#[cfg(test)]
pub(crate) use self::memory::{write_tar, write_tar_gz};
use crate::{Body, Result};

/// Dispatches authenticated requests to one Swift account.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// The account endpoint, e.g. `https://swift.example.com/v1/AUTH_test/`.
    /// Always ends with `/`.
    fn endpoint_url(&self) -> &str;

    /// An independent backend for another endpoint. Used to switch accounts;
    /// the new endpoint must not leak back into `self`.
    fn clone_with_endpoint(&self, endpoint_url: &str) -> Result<Arc<dyn Backend>>;

    /// Send a request with credentials attached. On a 401, re-authenticate
    /// and retry once if the body can be replayed.
    async fn execute(&self, request: ::http::Request<Body>) -> Result<::http::Response<Body>>;
}
