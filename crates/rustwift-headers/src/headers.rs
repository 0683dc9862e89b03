//! Case-insensitive header map.

use std::collections::BTreeMap;

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::HeaderError;

/// Canonicalise a header name: the first letter and every letter following a
/// hyphen are upper-cased, all others lower-cased.
///
/// # Examples
///
/// ```
/// use rustwift_headers::canonical_key;
///
/// assert_eq!(canonical_key("x-object-META-fOO"), "X-Object-Meta-Foo");
/// assert_eq!(canonical_key("ETag"), "Etag");
/// ```
#[must_use]
pub fn canonical_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = true;
    for c in key.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// A case-insensitive map from header name to a single string value.
///
/// Multi-valued HTTP headers collapse to their first value when read from the
/// wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Create an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a header, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&canonical_key(key)).map(String::as_str)
    }

    /// Whether a header is present (with any value, including an empty one).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&canonical_key(key))
    }

    /// Set a header, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(canonical_key(key), value.into());
    }

    /// Remove a header from the local map.
    ///
    /// When the map is sent to the server, a removed key leaves the server
    /// state unchanged (except for object metadata).
    pub fn del(&mut self, key: &str) {
        self.0.remove(&canonical_key(key));
    }

    /// Set a header to the empty string, which Swift interprets as "remove
    /// this key" on update.
    pub fn clear(&mut self, key: &str) {
        self.set(key, String::new());
    }

    /// Iterate over `(canonical name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every entry of `other` into this map, overwriting duplicates.
    pub fn extend(&mut self, other: &Headers) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Read from an HTTP header map.
    ///
    /// Only the first value of each header is kept. Values that are not
    /// valid UTF-8 are decoded lossily.
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut out = Self::new();
        for name in map.keys() {
            if let Some(value) = map.get(name) {
                let value = match value.to_str() {
                    Ok(s) => s.to_owned(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                };
                out.set(name.as_str(), value);
            }
        }
        out
    }

    /// Convert into an HTTP header map.
    pub fn to_header_map(&self) -> Result<HeaderMap, HeaderError> {
        self.to_header_map_filtered(|_, _| true)
    }

    /// Convert into an HTTP header map, keeping only entries for which
    /// `keep` returns true.
    pub fn to_header_map_filtered(
        &self,
        mut keep: impl FnMut(&str, &str) -> bool,
    ) -> Result<HeaderMap, HeaderError> {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (k, v) in &self.0 {
            if !keep(k, v) {
                continue;
            }
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| HeaderError::InvalidName(k.clone()))?;
            let value =
                HeaderValue::from_str(v).map_err(|_| HeaderError::InvalidValue(k.clone()))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    pub(crate) fn keys_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0
            .range(prefix.to_owned()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.set(k.as_ref(), v);
        }
        out
    }
}
