//! Object headers.

use crate::{HeaderError, Headers, Text, UnixSeconds, UnixTime, Unsigned};

const META_PREFIX: &str = "X-Object-Meta-";

/// Headers of a Swift object.
///
/// Unlike accounts and containers, object metadata is replaced wholesale by
/// every PUT or POST, so [`ObjectHeaders::to_header_map`] omits metadata keys
/// with empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHeaders(Headers);

header_set!(
    ObjectHeaders,
    meta = "X-Object-Meta-",
    unsigned = ["Content-Length", "X-Delete-At"],
    times = ["X-Timestamp"]
);

impl ObjectHeaders {
    read_only_field!(
        /// Creation time of this object version.
        created_at: UnixTime = "X-Timestamp"
    );
    read_write_field!(
        /// MIME type of the content.
        content_type, content_type_mut: Text = "Content-Type"
    );
    read_write_field!(
        /// `Content-Disposition` returned on download.
        content_disposition, content_disposition_mut: Text = "Content-Disposition"
    );
    read_write_field!(
        /// `Content-Encoding` returned on download.
        content_encoding, content_encoding_mut: Text = "Content-Encoding"
    );
    read_write_field!(
        /// Content length in bytes.
        size_bytes, size_bytes_mut: Unsigned = "Content-Length"
    );
    read_write_field!(
        /// MD5 hex digest of the content. For large objects this is the
        /// quoted digest of the segment digests.
        etag, etag_mut: Text = "Etag"
    );
    read_write_field!(
        /// Time at which Swift deletes the object.
        expires_at, expires_at_mut: UnixSeconds = "X-Delete-At"
    );
    read_write_field!(
        /// Target of a symlink object (`container/object`).
        symlink_target, symlink_target_mut: Text = "X-Symlink-Target"
    );
    read_write_field!(
        /// Manifest of a dynamic large object (`container/prefix`).
        large_object_manifest, large_object_manifest_mut: Text = "X-Object-Manifest"
    );

    /// Whether the object is a static large object.
    #[must_use]
    pub fn is_static_large_object(&self) -> bool {
        self.0
            .get("X-Static-Large-Object")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Whether the object is a dynamic large object.
    #[must_use]
    pub fn is_dynamic_large_object(&self) -> bool {
        self.large_object_manifest().exists()
    }

    /// Whether the object is a large object of either kind.
    #[must_use]
    pub fn is_large_object(&self) -> bool {
        self.is_static_large_object() || self.is_dynamic_large_object()
    }

    /// Convert into an HTTP header map for an upload or update request.
    ///
    /// Metadata entries with empty values are dropped.
    pub fn to_header_map(&self) -> Result<http::HeaderMap, HeaderError> {
        self.0
            .to_header_map_filtered(|k, v| !(v.is_empty() && k.starts_with(META_PREFIX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_omit_empty_object_metadata() {
        let mut hdr = ObjectHeaders::new();
        hdr.metadata_mut().set("Keep", "yes");
        hdr.metadata_mut().clear("Drop");
        hdr.large_object_manifest_mut().clear();
        let map = hdr.to_header_map().unwrap();
        assert_eq!(map.get("x-object-meta-keep").unwrap(), "yes");
        assert!(map.get("x-object-meta-drop").is_none());
        assert_eq!(map.get("x-object-manifest").unwrap(), "");
    }

    #[test]
    fn test_should_detect_large_objects() {
        let mut hdr = ObjectHeaders::new();
        assert!(!hdr.is_large_object());

        hdr.set("X-Static-Large-Object", "True");
        assert!(hdr.is_static_large_object());
        assert!(!hdr.is_dynamic_large_object());

        let mut dlo = ObjectHeaders::new();
        dlo.set("X-Object-Manifest", "segments/prefix");
        assert!(dlo.is_dynamic_large_object());
        assert!(dlo.is_large_object());
    }

    #[test]
    fn test_should_read_size_and_expiry() {
        let mut hdr = ObjectHeaders::new();
        hdr.set("content-length", "128");
        hdr.set("x-delete-at", "1700000000");
        assert_eq!(hdr.size_bytes().get(), Some(128));
        assert_eq!(hdr.expires_at().get().unwrap().timestamp(), 1_700_000_000);
        assert!(hdr.validate().is_ok());
    }

    #[test]
    fn test_should_report_malformed_content_length() {
        let mut hdr = ObjectHeaders::new();
        hdr.set("Content-Length", "abc");
        assert!(matches!(hdr.validate(), Err(HeaderError::Malformed { .. })));
    }
}
