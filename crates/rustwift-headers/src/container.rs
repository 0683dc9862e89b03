//! Container headers.

use crate::{Headers, Text, UnixTime, Unsigned};

/// Headers of a Swift container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHeaders(Headers);

header_set!(
    ContainerHeaders,
    meta = "X-Container-Meta-",
    unsigned = [
        "X-Container-Bytes-Used",
        "X-Container-Object-Count",
        "X-Container-Meta-Quota-Bytes",
        "X-Container-Meta-Quota-Count",
    ],
    times = ["X-Timestamp"]
);

impl ContainerHeaders {
    read_only_field!(
        /// Total bytes stored in the container.
        bytes_used: Unsigned = "X-Container-Bytes-Used"
    );
    read_only_field!(
        /// Number of objects in the container.
        object_count: Unsigned = "X-Container-Object-Count"
    );
    read_only_field!(
        /// Creation time of the container.
        created_at: UnixTime = "X-Timestamp"
    );
    read_write_field!(
        /// Quota on bytes stored.
        bytes_used_quota, bytes_used_quota_mut: Unsigned = "X-Container-Meta-Quota-Bytes"
    );
    read_write_field!(
        /// Quota on object count.
        object_count_quota, object_count_quota_mut: Unsigned = "X-Container-Meta-Quota-Count"
    );
    read_write_field!(
        /// Read ACL.
        read_acl, read_acl_mut: Text = "X-Container-Read"
    );
    read_write_field!(
        /// Write ACL.
        write_acl, write_acl_mut: Text = "X-Container-Write"
    );
    read_write_field!(
        /// Shared secret for container sync.
        sync_key, sync_key_mut: Text = "X-Container-Sync-Key"
    );
    read_write_field!(
        /// Container sync target.
        sync_to, sync_to_mut: Text = "X-Container-Sync-To"
    );
    read_write_field!(
        /// Primary secret for temporary URLs.
        temp_url_key, temp_url_key_mut: Text = "X-Container-Meta-Temp-Url-Key"
    );
    read_write_field!(
        /// Secondary secret for temporary URLs.
        temp_url_key_2, temp_url_key_2_mut: Text = "X-Container-Meta-Temp-Url-Key-2"
    );
    read_write_field!(
        /// Container receiving old object versions (history mode).
        history_location, history_location_mut: Text = "X-History-Location"
    );
    read_write_field!(
        /// Container receiving old object versions (stack mode).
        versions_location, versions_location_mut: Text = "X-Versions-Location"
    );
    read_write_field!(
        /// Storage policy. Can only be set when the container is created.
        storage_policy, storage_policy_mut: Text = "X-Storage-Policy"
    );

    /// Convert into an HTTP header map for an update or create request.
    ///
    /// Empty values are sent as-is so that Swift removes those keys.
    pub fn to_header_map(&self) -> Result<http::HeaderMap, crate::HeaderError> {
        self.0.to_header_map()
    }
}
