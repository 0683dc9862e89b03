//! Typed views onto single header keys.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, TimeZone, Utc};

use crate::{HeaderError, Headers};

/// How a header value is parsed and rendered.
pub trait FieldKind {
    /// The decoded value type.
    type Value;

    /// Decode a raw header value.
    fn parse(raw: &str) -> Result<Self::Value, String>;

    /// Encode a value for the wire.
    fn render(value: &Self::Value) -> String;
}

/// A free-form string field.
#[derive(Debug, Clone, Copy)]
pub enum Text {}

impl FieldKind for Text {
    type Value = String;

    fn parse(raw: &str) -> Result<String, String> {
        Ok(raw.to_owned())
    }

    fn render(value: &String) -> String {
        value.clone()
    }
}

/// A non-negative decimal integer field.
#[derive(Debug, Clone, Copy)]
pub enum Unsigned {}

impl FieldKind for Unsigned {
    type Value = u64;

    fn parse(raw: &str) -> Result<u64, String> {
        raw.parse::<u64>().map_err(|e| e.to_string())
    }

    fn render(value: &u64) -> String {
        value.to_string()
    }
}

/// A UNIX timestamp with optional fractional seconds, e.g. `1528123456.12345`.
#[derive(Debug, Clone, Copy)]
pub enum UnixTime {}

impl FieldKind for UnixTime {
    type Value = DateTime<Utc>;

    fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        let (secs, frac) = raw.split_once('.').unwrap_or((raw, ""));
        let secs: i64 = secs.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
        let nanos = if frac.is_empty() {
            0
        } else {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid fractional seconds: {frac}"));
            }
            let mut digits: String = frac.chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            digits.parse::<u32>().map_err(|e| e.to_string())?
        };
        Utc.timestamp_opt(secs, nanos)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {raw}"))
    }

    fn render(value: &DateTime<Utc>) -> String {
        let nanos = value.timestamp_subsec_nanos();
        if nanos == 0 {
            value.timestamp().to_string()
        } else {
            let frac = format!("{nanos:09}");
            format!("{}.{}", value.timestamp(), frac.trim_end_matches('0'))
        }
    }
}

/// A UNIX timestamp in whole seconds, e.g. `X-Delete-At`.
#[derive(Debug, Clone, Copy)]
pub enum UnixSeconds {}

impl FieldKind for UnixSeconds {
    type Value = DateTime<Utc>;

    fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        let secs: i64 = raw.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
        Utc.timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {raw}"))
    }

    fn render(value: &DateTime<Utc>) -> String {
        value.timestamp().to_string()
    }
}

/// A typed view onto one key of a [`Headers`] map.
///
/// `H` is either `&Headers` (read-only) or `&mut Headers` (read-write).
#[derive(Debug)]
pub struct Field<H, K> {
    headers: H,
    key: &'static str,
    kind: PhantomData<K>,
}

impl<H, K> Field<H, K> {
    /// Create a view onto `key`.
    pub fn new(headers: H, key: &'static str) -> Self {
        Self {
            headers,
            key,
            kind: PhantomData,
        }
    }

    /// The header name this field reads.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<H: Deref<Target = Headers>, K: FieldKind> Field<H, K> {
    /// Whether the header is present with a non-empty value.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.raw().is_some_and(|v| !v.is_empty())
    }

    /// The raw header value.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.headers.get(self.key)
    }

    /// The decoded value, or `None` if the header is absent, empty or
    /// malformed. Use [`Field::validate`] to distinguish the last case.
    #[must_use]
    pub fn get(&self) -> Option<K::Value> {
        self.raw()
            .filter(|v| !v.is_empty())
            .and_then(|v| K::parse(v).ok())
    }

    /// Check that the value parses, if present.
    pub fn validate(&self) -> Result<(), HeaderError> {
        match self.raw() {
            Some(v) if !v.is_empty() => {
                K::parse(v).map_err(|reason| HeaderError::Malformed {
                    key: self.key.to_owned(),
                    reason,
                })?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl<H: DerefMut<Target = Headers>, K: FieldKind> Field<H, K> {
    /// Set the value.
    pub fn set(&mut self, value: K::Value) {
        let rendered = K::render(&value);
        self.headers.set(self.key, rendered);
    }

    /// Remove the key from the local map (no change on the server).
    pub fn del(&mut self) {
        self.headers.del(self.key);
    }

    /// Set the key to the empty string (removal on the server).
    pub fn clear(&mut self) {
        self.headers.clear(self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_read_and_write_unsigned() {
        let mut hdr = Headers::new();
        Field::<_, Unsigned>::new(&mut hdr, "X-Account-Bytes-Used").set(42);
        let field = Field::<_, Unsigned>::new(&hdr, "X-Account-Bytes-Used");
        assert!(field.exists());
        assert_eq!(field.get(), Some(42));
        assert_eq!(field.raw(), Some("42"));
    }

    #[test]
    fn test_should_report_malformed_unsigned() {
        let mut hdr = Headers::new();
        hdr.set("X-Account-Bytes-Used", "-1");
        let field = Field::<_, Unsigned>::new(&hdr, "X-Account-Bytes-Used");
        assert_eq!(field.get(), None);
        assert!(matches!(
            field.validate(),
            Err(HeaderError::Malformed { ref key, .. }) if key == "X-Account-Bytes-Used"
        ));
    }

    #[test]
    fn test_should_treat_empty_as_absent() {
        let mut hdr = Headers::new();
        Field::<_, Text>::new(&mut hdr, "X-Container-Read").clear();
        let field = Field::<_, Text>::new(&hdr, "X-Container-Read");
        assert!(!field.exists());
        assert_eq!(field.get(), None);
        assert_eq!(field.raw(), Some(""));
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_should_parse_fractional_timestamp() {
        let t = UnixTime::parse("1528123456.25").unwrap();
        assert_eq!(t.timestamp(), 1_528_123_456);
        assert_eq!(t.timestamp_subsec_millis(), 250);
        assert_eq!(UnixTime::render(&t), "1528123456.25");
        assert_eq!(UnixTime::render(&UnixTime::parse("17").unwrap()), "17");
    }

    #[test]
    fn test_should_reject_bad_timestamps() {
        assert!(UnixTime::parse("abc").is_err());
        assert!(UnixTime::parse("12.3x").is_err());
        assert!(UnixSeconds::parse("12.5").is_err());
        assert_eq!(UnixSeconds::parse("60").unwrap().timestamp(), 60);
    }

    #[test]
    fn test_should_delete_field() {
        let mut hdr = Headers::new();
        hdr.set("Content-Type", "text/plain");
        Field::<_, Text>::new(&mut hdr, "Content-Type").del();
        assert!(hdr.is_empty());
    }
}
