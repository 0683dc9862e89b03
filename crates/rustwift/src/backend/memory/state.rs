//! Store of the in-memory backend.
//!
//! [`SwiftStore`] maps account names to [`AccountState`]. Each account owns
//! its containers and objects in `BTreeMap`s, so listings come out sorted
//! without extra work. Accounts are created on first access.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use http::StatusCode;
use rustwift_headers::Headers;

use crate::checksums::compute_md5;
use crate::large_object::SegmentRange;

/// Nesting depth after which large object assembly gives up.
const MAX_MANIFEST_DEPTH: usize = 10;

/// All accounts of one emulated cluster.
#[derive(Debug, Default)]
pub(super) struct SwiftStore {
    accounts: DashMap<String, AccountState>,
}

impl SwiftStore {
    /// Exclusive access to an account, creating it if needed. The flag tells
    /// whether it was just created.
    pub(super) fn account(&self, name: &str) -> (RefMut<'_, String, AccountState>, bool) {
        let created = !self.accounts.contains_key(name);
        let account = self
            .accounts
            .entry(name.to_owned())
            .or_insert_with(AccountState::new);
        (account, created)
    }
}

/// An account with its metadata and containers.
#[derive(Debug)]
pub(super) struct AccountState {
    pub headers: Headers,
    pub containers: BTreeMap<String, ContainerState>,
    pub created_at: DateTime<Utc>,
}

impl AccountState {
    fn new() -> Self {
        Self {
            headers: Headers::new(),
            containers: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub(super) fn object_count(&self) -> usize {
        self.containers.values().map(|c| c.objects.len()).sum()
    }

    pub(super) fn bytes_used(&self) -> u64 {
        self.containers.values().map(ContainerState::bytes_used).sum()
    }

    pub(super) fn object(&self, container: &str, object: &str) -> Option<&StoredObject> {
        self.containers.get(container)?.objects.get(object)
    }

    /// The bytes a GET on `container/object` would return, following
    /// large object manifests.
    pub(super) fn content(&self, container: &str, object: &str) -> Result<Bytes, StatusCode> {
        self.content_at_depth(container, object, 0)
    }

    fn content_at_depth(
        &self,
        container: &str,
        object: &str,
        depth: usize,
    ) -> Result<Bytes, StatusCode> {
        if depth > MAX_MANIFEST_DEPTH {
            return Err(StatusCode::CONFLICT);
        }
        let stored = self.object(container, object).ok_or(StatusCode::NOT_FOUND)?;
        match &stored.kind {
            ObjectKind::Plain => Ok(stored.data.clone()),
            ObjectKind::Dynamic(manifest) => {
                let Some((seg_container, prefix)) = manifest.split_once('/') else {
                    return Ok(Bytes::new());
                };
                let mut out = BytesMut::new();
                if let Some(c) = self.containers.get(seg_container) {
                    for (name, _) in c.objects_with_prefix(prefix) {
                        out.extend_from_slice(&self.content_at_depth(seg_container, name, depth + 1)?);
                    }
                }
                Ok(out.freeze())
            }
            ObjectKind::Static(segments) => {
                let mut out = BytesMut::new();
                for segment in segments {
                    match segment {
                        StoredSegment::Data(data) => out.extend_from_slice(data),
                        StoredSegment::Object {
                            container,
                            object,
                            range,
                            ..
                        } => {
                            let content = self
                                .content_at_depth(container, object, depth + 1)
                                .map_err(|_| StatusCode::CONFLICT)?;
                            let (start, end) = resolve_range(*range, content.len())
                                .ok_or(StatusCode::CONFLICT)?;
                            out.extend_from_slice(&content[start..end]);
                        }
                    }
                }
                Ok(out.freeze())
            }
        }
    }

    /// Size and Etag of `container/object` as reported by HEAD.
    pub(super) fn size_and_etag(
        &self,
        container: &str,
        object: &str,
    ) -> Result<(u64, String), StatusCode> {
        let stored = self.object(container, object).ok_or(StatusCode::NOT_FOUND)?;
        match &stored.kind {
            ObjectKind::Plain | ObjectKind::Static(_) => Ok((stored.size, stored.etag.clone())),
            ObjectKind::Dynamic(manifest) => {
                let Some((seg_container, prefix)) = manifest.split_once('/') else {
                    return Ok((0, format!("\"{}\"", compute_md5(b""))));
                };
                let segments: Vec<&StoredObject> = self
                    .containers
                    .get(seg_container)
                    .map(|c| c.objects_with_prefix(prefix).map(|(_, o)| o).collect())
                    .unwrap_or_default();
                let size = segments.iter().map(|o| o.size).sum();
                let etags: String = segments.iter().map(|o| o.etag.trim_matches('"')).collect();
                Ok((size, format!("\"{}\"", compute_md5(etags.as_bytes()))))
            }
        }
    }
}

/// A container with its metadata and objects.
#[derive(Debug)]
pub(super) struct ContainerState {
    pub headers: Headers,
    pub objects: BTreeMap<String, StoredObject>,
    pub created_at: DateTime<Utc>,
}

impl ContainerState {
    pub(super) fn new() -> Self {
        Self {
            headers: Headers::new(),
            objects: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub(super) fn bytes_used(&self) -> u64 {
        self.objects.values().map(|o| o.data.len() as u64).sum()
    }

    pub(super) fn last_modified(&self) -> DateTime<Utc> {
        self.objects
            .values()
            .map(|o| o.last_modified)
            .max()
            .unwrap_or(self.created_at)
    }

    pub(super) fn objects_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a StoredObject)> + 'a {
        self.objects
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, o)| (name.as_str(), o))
    }
}

/// An object. `data` holds the uploaded body (the manifest for an SLO).
#[derive(Debug, Clone)]
pub(super) struct StoredObject {
    pub data: Bytes,
    pub headers: Headers,
    pub size: u64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub kind: ObjectKind,
}

/// How an object's content is produced.
#[derive(Debug, Clone)]
pub(super) enum ObjectKind {
    Plain,
    /// `container/prefix` from `X-Object-Manifest`.
    Dynamic(String),
    Static(Vec<StoredSegment>),
}

/// A validated SLO manifest entry.
#[derive(Debug, Clone)]
pub(super) enum StoredSegment {
    Object {
        container: String,
        object: String,
        size_bytes: u64,
        etag: String,
        range: SegmentRange,
    },
    Data(Bytes),
}

/// Byte bounds `[start, end)` selected by `range` in a body of `len` bytes,
/// or `None` if the range is not satisfiable.
pub(super) fn resolve_range(range: SegmentRange, len: usize) -> Option<(usize, usize)> {
    let len = len as u64;
    let length = range.length();
    let (start, end) = if range.is_full() {
        (0, len)
    } else if range.offset() < 0 {
        if length > len {
            return None;
        }
        (len - length, len)
    } else {
        let start = range.offset().unsigned_abs();
        let end = if length == 0 {
            len
        } else {
            start.checked_add(length)?
        };
        if start >= len || end > len {
            return None;
        }
        (start, end)
    };
    Some((usize::try_from(start).ok()?, usize::try_from(end).ok()?))
}
