//! Prefix-scoped metadata view.

use std::ops::{Deref, DerefMut};

use crate::{Headers, canonical_key};

/// A case-insensitive map view onto all headers sharing a prefix, such as
/// `X-Object-Meta-`. Keys are given and returned without the prefix.
#[derive(Debug)]
pub struct Metadata<H> {
    headers: H,
    prefix: &'static str,
}

impl<H> Metadata<H> {
    /// Create a view over `prefix`, which must be in canonical form.
    pub fn new(headers: H, prefix: &'static str) -> Self {
        Self { headers, prefix }
    }

    fn full_key(&self, key: &str) -> String {
        canonical_key(&format!("{}{key}", self.prefix))
    }
}

impl<H: Deref<Target = Headers>> Metadata<H> {
    /// Get the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(&self.full_key(key))
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.headers.contains(&self.full_key(key))
    }

    /// Iterate over `(key without prefix, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let prefix = self.prefix;
        self.headers
            .keys_with_prefix(prefix)
            .map(move |(k, v)| (&k[prefix.len()..], v))
    }

    /// Number of metadata entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether there is no metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<H: DerefMut<Target = Headers>> Metadata<H> {
    /// Set `key` to `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let full = self.full_key(key);
        self.headers.set(&full, value);
    }

    /// Remove `key` from the local map.
    pub fn del(&mut self, key: &str) {
        let full = self.full_key(key);
        self.headers.del(&full);
    }

    /// Set `key` to the empty string.
    pub fn clear(&mut self, key: &str) {
        let full = self.full_key(key);
        self.headers.clear(&full);
    }
}
