//! Segment descriptors and SLO range syntax.

use std::fmt;

use bytes::Bytes;

use crate::Object;

/// A byte range within a segment object.
///
/// | offset | length | meaning                         |
/// |--------|--------|---------------------------------|
/// | 0      | 0      | the whole object                |
/// | ≥ 0    | > 0    | `length` bytes from `offset`    |
/// | > 0    | 0      | everything from `offset` on     |
/// | < 0    | > 0    | the last `length` bytes         |
///
/// Negative offsets are normalized to -1, since only their sign matters.
///
/// # Examples
///
/// ```
/// use rustwift::large_object::SegmentRange;
///
/// let range = SegmentRange::new(10, 5);
/// assert_eq!(range.to_string(), "10-14");
/// assert_eq!(SegmentRange::parse("10-14"), Some(range));
/// assert_eq!(SegmentRange::suffix(100).to_string(), "-100");
/// assert!(SegmentRange::parse("5-3").is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentRange {
    offset: i64,
    length: u64,
}

impl SegmentRange {
    /// The whole object.
    #[must_use]
    pub const fn full() -> Self {
        Self { offset: 0, length: 0 }
    }

    /// A range from `offset` spanning `length` bytes (0 means "to the end").
    #[must_use]
    pub const fn new(offset: i64, length: u64) -> Self {
        let offset = if offset < 0 { -1 } else { offset };
        Self { offset, length }
    }

    /// The last `length` bytes.
    #[must_use]
    pub const fn suffix(length: u64) -> Self {
        Self { offset: -1, length }
    }

    /// Start offset, or -1 for a suffix range.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Length in bytes; 0 means "to the end".
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Whether this selects the whole object.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.offset == 0 && self.length == 0
    }

    /// Parse the `M-N`, `M-`, `-N` or `-` syntax of an SLO manifest.
    ///
    /// Fails if `N < M` or a number does not fit.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.split_once('-')?;
        match (start, end) {
            ("", "") => Some(Self::full()),
            ("", n) => Some(Self::suffix(n.parse().ok()?)),
            (m, "") => Some(Self::new(parse_offset(m)?, 0)),
            (m, n) => {
                let m = parse_offset(m)?;
                let n: u64 = n.parse().ok()?;
                let first = m.unsigned_abs();
                if n < first {
                    return None;
                }
                Some(Self::new(m, n - first + 1))
            }
        }
    }

    /// The manifest rendering, or `None` for the whole object.
    #[must_use]
    pub fn to_manifest_value(&self) -> Option<String> {
        if self.is_full() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

fn parse_offset(raw: &str) -> Option<i64> {
    if raw.starts_with(['+', '-']) {
        return None;
    }
    raw.parse().ok()
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset < 0 {
            write!(f, "-{}", self.length)
        } else if self.length == 0 {
            write!(f, "{}-", self.offset)
        } else {
            let last = self.offset.unsigned_abs().saturating_add(self.length - 1);
            write!(f, "{}-{last}", self.offset)
        }
    }
}

/// A segment backed by an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSegment {
    /// The segment object.
    pub object: Object,
    /// Size of the segment object, if known. Swift checks it for SLOs.
    pub size_bytes: Option<u64>,
    /// MD5 hex digest of the segment object, if known. Swift checks it for
    /// SLOs.
    pub etag: Option<String>,
    /// Part of the object to use. Only SLOs support ranges.
    pub range: SegmentRange,
}

impl ObjectSegment {
    /// A segment spanning the whole `object`, without size or Etag checks.
    #[must_use]
    pub fn new(object: Object) -> Self {
        Self {
            object,
            size_bytes: None,
            etag: None,
            range: SegmentRange::full(),
        }
    }
}

/// One segment of a large object.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentInfo {
    /// Content taken from another object.
    Object(ObjectSegment),
    /// Content stored inline in an SLO manifest. Must not be empty.
    Data(Bytes),
}

impl SegmentInfo {
    /// The backing object, if any.
    #[must_use]
    pub fn object(&self) -> Option<&Object> {
        match self {
            Self::Object(seg) => Some(&seg.object),
            Self::Data(_) => None,
        }
    }
}

impl From<ObjectSegment> for SegmentInfo {
    fn from(seg: ObjectSegment) -> Self {
        Self::Object(seg)
    }
}
