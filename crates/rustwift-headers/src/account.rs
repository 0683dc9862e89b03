//! Account headers.

use crate::{Headers, Text, UnixTime, Unsigned};

/// Headers of a Swift account.
///
/// # Examples
///
/// ```
/// use rustwift_headers::AccountHeaders;
///
/// let mut hdr = AccountHeaders::new();
/// hdr.set("X-Account-Object-Count", "12");
/// hdr.temp_url_key_mut().set("secret".to_owned());
///
/// assert_eq!(hdr.object_count().get(), Some(12));
/// assert_eq!(hdr.get("X-Account-Meta-Temp-Url-Key"), Some("secret"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountHeaders(Headers);

header_set!(
    AccountHeaders,
    meta = "X-Account-Meta-",
    unsigned = [
        "X-Account-Bytes-Used",
        "X-Account-Container-Count",
        "X-Account-Object-Count",
        "X-Account-Meta-Quota-Bytes",
    ],
    times = ["X-Timestamp"]
);

impl AccountHeaders {
    read_only_field!(
        /// Total bytes stored in the account.
        bytes_used: Unsigned = "X-Account-Bytes-Used"
    );
    read_only_field!(
        /// Number of containers.
        container_count: Unsigned = "X-Account-Container-Count"
    );
    read_only_field!(
        /// Number of objects.
        object_count: Unsigned = "X-Account-Object-Count"
    );
    read_only_field!(
        /// Creation time of the account.
        created_at: UnixTime = "X-Timestamp"
    );
    read_write_field!(
        /// Quota on bytes stored (`X-Account-Meta-Quota-Bytes`).
        bytes_used_quota, bytes_used_quota_mut: Unsigned = "X-Account-Meta-Quota-Bytes"
    );
    read_write_field!(
        /// Primary secret for temporary URLs.
        temp_url_key, temp_url_key_mut: Text = "X-Account-Meta-Temp-Url-Key"
    );
    read_write_field!(
        /// Secondary secret for temporary URLs.
        temp_url_key_2, temp_url_key_2_mut: Text = "X-Account-Meta-Temp-Url-Key-2"
    );

    /// Convert into an HTTP header map for an update or create request.
    ///
    /// Empty values are sent as-is so that Swift removes those keys.
    pub fn to_header_map(&self) -> Result<http::HeaderMap, crate::HeaderError> {
        self.0.to_header_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeaderError;

    #[test]
    fn test_should_read_usage_counters() {
        let hdr: AccountHeaders = [
            ("x-account-bytes-used", "1024"),
            ("x-account-container-count", "2"),
            ("x-account-object-count", "7"),
        ]
        .into_iter()
        .collect::<Headers>()
        .into();
        assert_eq!(hdr.bytes_used().get(), Some(1024));
        assert_eq!(hdr.container_count().get(), Some(2));
        assert_eq!(hdr.object_count().get(), Some(7));
        assert!(hdr.validate().is_ok());
    }

    #[test]
    fn test_should_report_malformed_quota() {
        let mut hdr = AccountHeaders::new();
        hdr.set("X-Account-Meta-Quota-Bytes", "lots");
        assert_eq!(hdr.bytes_used_quota().get(), None);
        assert!(matches!(
            hdr.validate(),
            Err(HeaderError::Malformed { key, .. }) if key == "X-Account-Meta-Quota-Bytes"
        ));
    }

    #[test]
    fn test_should_send_cleared_metadata() {
        let mut hdr = AccountHeaders::new();
        hdr.metadata_mut().clear("Foo");
        hdr.temp_url_key_2_mut().clear();
        let map = hdr.to_header_map().unwrap();
        assert_eq!(map.get("x-account-meta-foo").unwrap(), "");
        assert_eq!(map.get("x-account-meta-temp-url-key-2").unwrap(), "");
    }

    #[test]
    fn test_should_expose_quota_as_metadata() {
        let mut hdr = AccountHeaders::new();
        hdr.bytes_used_quota_mut().set(5000);
        assert_eq!(hdr.metadata().get("quota-bytes"), Some("5000"));
    }
}
