//! Client for OpenStack Swift object storage.
//!
//! The entry point is an [`Account`], built from a [`Backend`](backend::Backend)
//! that knows the account endpoint and how to authenticate. Handles for
//! containers and objects are derived from it without any request; each
//! handle caches the headers it last saw until a mutating call invalidates
//! them.
//!
//! ```no_run
//! # async fn run() -> rustwift::Result<()> {
//! use std::sync::Arc;
//!
//! use rustwift::Account;
//! use rustwift::backend::{HttpBackend, HttpBackendConfig};
//! use rustwift::rustwift_auth::SwauthV1;
//! use rustwift::rustwift_headers::ObjectHeaders;
//!
//! let auth = SwauthV1::new("https://swift.example.com/auth/v1.0", "test:tester", "testing");
//! let backend = HttpBackend::connect(Arc::new(auth), HttpBackendConfig::default()).await?;
//! let account = Account::new(Arc::new(backend))?;
//!
//! let mut container = account.container("photos");
//! container.ensure_exists().await?;
//! let mut object = container.object("cat.jpg");
//! object.upload(std::fs::read("cat.jpg")?, &ObjectHeaders::new(), None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Large objects, assembled from segments, are handled by the
//! [`large_object`] module.

mod account;
pub mod backend;
mod body;
mod bulk;
mod capabilities;
pub mod checksums;
mod container;
mod error;
pub mod iterator;
pub mod large_object;
mod object;
mod request;

pub use rustwift_auth;
pub use rustwift_headers;

pub use self::account::Account;
pub use self::body::Body;
pub use self::bulk::{BulkDeleteReport, BulkUploadFormat};
pub use self::capabilities::{
    BulkDeleteCapability, BulkUploadCapability, Capabilities, SloCapability, SwiftCapability,
    TempUrlCapability,
};
pub use self::container::Container;
pub use self::error::{BulkError, BulkObjectError, Error, Result};
pub use self::object::{DeleteOptions, DownloadedObject, Object};
pub use self::request::RequestOptions;
