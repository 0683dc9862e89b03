//! Server capability discovery (`GET /info`).

use serde::{Deserialize, Serialize};

use rustwift_auth::TempUrlDigest;

/// Features advertised by a Swift cluster.
///
/// Only the sections this crate acts on are typed; everything else is kept
/// in [`Capabilities::other`].
///
/// # Examples
///
/// ```
/// use rustwift::Capabilities;
///
/// let caps: Capabilities = serde_json::from_str(
///     r#"{"swift": {"version": "2.30.0"}, "bulk_delete": {"max_deletes_per_request": 1000}}"#,
/// )
/// .unwrap();
/// assert_eq!(caps.swift.version.as_deref(), Some("2.30.0"));
/// assert_eq!(caps.bulk_delete.unwrap().max_deletes_per_request, 1000);
/// assert!(caps.bulk_upload.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Core Swift limits.
    #[serde(default)]
    pub swift: SwiftCapability,

    /// Bulk delete middleware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_delete: Option<BulkDeleteCapability>,

    /// Bulk upload (archive extraction) middleware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_upload: Option<BulkUploadCapability>,

    /// Static large object middleware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slo: Option<SloCapability>,

    /// Temporary URL middleware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempurl: Option<TempUrlCapability>,

    /// Sections not covered above, keyed by middleware name.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// The `swift` section of `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwiftCapability {
    /// Swift release.
    pub version: Option<String>,
    /// Largest object that can be uploaded in one request.
    pub max_file_size: Option<u64>,
    /// Longest allowed object name.
    pub max_object_name_length: Option<u64>,
    /// Most entries returned by one container listing.
    pub container_listing_limit: Option<u64>,
    /// Most entries returned by one account listing.
    pub account_listing_limit: Option<u64>,
}

/// The `bulk_delete` section of `/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteCapability {
    /// Most items accepted by one bulk delete request.
    #[serde(default = "default_max_deletes")]
    pub max_deletes_per_request: u64,
    /// Failures after which a bulk delete request is aborted.
    #[serde(default)]
    pub max_failed_deletes: u64,
}

impl Default for BulkDeleteCapability {
    fn default() -> Self {
        Self {
            max_deletes_per_request: default_max_deletes(),
            max_failed_deletes: 1000,
        }
    }
}

fn default_max_deletes() -> u64 {
    10_000
}

/// The `bulk_upload` section of `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkUploadCapability {
    /// Most containers one archive may create.
    pub max_containers_per_extraction: u64,
    /// Failures after which an extraction is aborted.
    pub max_failed_extractions: u64,
}

/// The `slo` section of `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SloCapability {
    /// Most segments in one manifest.
    pub max_manifest_segments: Option<u64>,
    /// Largest manifest body in bytes.
    pub max_manifest_size: Option<u64>,
    /// Smallest allowed segment (except the last).
    pub min_segment_size: Option<u64>,
}

/// The `tempurl` section of `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempUrlCapability {
    /// HTTP methods a temporary URL may be issued for.
    pub methods: Vec<String>,
    /// Digest names accepted for signatures. Older clusters omit this and
    /// accept SHA-1 only.
    pub allowed_digests: Option<Vec<String>>,
}

impl TempUrlCapability {
    /// The digests this cluster accepts, ignoring unknown names.
    #[must_use]
    pub fn digests(&self) -> Vec<TempUrlDigest> {
        match &self.allowed_digests {
            Some(names) => names.iter().filter_map(|n| n.parse().ok()).collect(),
            None => vec![TempUrlDigest::Sha1],
        }
    }
}
