//! In-process emulation of the Swift API.
//!
//! [`MemoryBackend`] answers requests from a shared in-memory store instead
//! of the network. It covers what this crate speaks: capability discovery,
//! account, container and object CRUD, listings, static and dynamic large
//! objects, bulk delete and (uncompressed) bulk upload. Authentication is not
//! emulated.

mod archive;
mod handler;
mod state;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

#[cfg(test)]
pub(crate) use self::archive::{write_tar, write_tar_gz};
use self::state::SwiftStore;
use super::Backend;
use crate::{Body, Result};

/// Features and addresses of a [`MemoryBackend`].
///
/// # Examples
///
/// ```
/// use rustwift::backend::MemoryBackendConfig;
///
/// let config = MemoryBackendConfig::builder().bulk_upload(true).build();
/// assert!(config.bulk_upload);
/// assert!(config.slo);
/// assert_eq!(config.account, "AUTH_test");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct MemoryBackendConfig {
    /// Cluster URL, ending in `/`.
    #[builder(default = "http://swift.memory/".to_owned(), setter(into))]
    pub base_url: String,

    /// Account the backend starts in.
    #[builder(default = "AUTH_test".to_owned(), setter(into))]
    pub account: String,

    /// Advertise and serve bulk delete.
    #[builder(default = true)]
    pub bulk_delete: bool,

    /// Batch limit advertised for bulk delete.
    #[builder(default = 10_000)]
    pub max_deletes_per_request: u64,

    /// Advertise and serve bulk upload.
    #[builder(default = false)]
    pub bulk_upload: bool,

    /// Advertise and serve static large objects.
    #[builder(default = true)]
    pub slo: bool,

    /// Advertise temporary URLs.
    #[builder(default = true)]
    pub tempurl: bool,

    /// Answer object PUTs with an Etag that does not match the stored data,
    /// as a proxy corrupting the transfer would.
    #[builder(default = false)]
    pub corrupt_put_etag: bool,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug)]
struct Shared {
    config: MemoryBackendConfig,
    store: SwiftStore,
    requests: AtomicU64,
}

/// A backend that keeps everything in memory.
///
/// Clones, including those made by [`Backend::clone_with_endpoint`], share
/// the store and the request counter.
#[derive(Clone)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
    endpoint_url: String,
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// A backend with the default configuration, at
    /// `http://swift.memory/v1/AUTH_test/`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryBackendConfig::default())
    }

    /// A backend with the given configuration.
    #[must_use]
    pub fn with_config(config: MemoryBackendConfig) -> Self {
        let endpoint_url = format!("{}v1/{}/", config.base_url, config.account);
        Self {
            shared: Arc::new(Shared {
                config,
                store: SwiftStore::default(),
                requests: AtomicU64::new(0),
            }),
            endpoint_url,
        }
    }

    /// Number of requests executed so far by this backend and its clones.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.shared.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn clone_with_endpoint(&self, endpoint_url: &str) -> Result<Arc<dyn Backend>> {
        Ok(Arc::new(Self {
            shared: Arc::clone(&self.shared),
            endpoint_url: endpoint_url.to_owned(),
        }))
    }

    async fn execute(&self, request: http::Request<Body>) -> Result<http::Response<Body>> {
        self.shared.requests.fetch_add(1, Ordering::SeqCst);
        let (parts, body) = request.into_parts();
        let body = body.collect().await?;
        Ok(handler::handle(
            &self.shared.store,
            &self.shared.config,
            &parts,
            body,
        ))
    }
}
