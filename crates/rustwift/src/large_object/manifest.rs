//! SLO manifest records and segment-location inference.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::segment::{ObjectSegment, SegmentInfo, SegmentRange};
use crate::{Account, Error, Result};

/// One entry of an SLO manifest, both as uploaded with
/// `multipart-manifest=put` and as returned by `multipart-manifest=get&format=raw`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ManifestRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ManifestRecord {
    pub(crate) fn from_segment(segment: &SegmentInfo) -> Self {
        match segment {
            SegmentInfo::Data(data) => Self {
                data: Some(STANDARD.encode(data)),
                ..Self::default()
            },
            SegmentInfo::Object(seg) => Self {
                path: format!("/{}", seg.object.full_name()),
                size_bytes: seg.size_bytes,
                etag: seg.etag.clone(),
                range: seg.range.to_manifest_value(),
                data: None,
            },
        }
    }

    /// Resolve this record against `account`.
    pub(crate) fn into_segment(self, account: &Account) -> Result<SegmentInfo> {
        if let Some(data) = self.data.filter(|d| !d.is_empty()) {
            let data = STANDARD
                .decode(data)
                .map_err(|e| Error::InvalidManifest(format!("bad inline data: {e}")))?;
            return Ok(SegmentInfo::Data(Bytes::from(data)));
        }

        let (container, object) = self
            .path
            .strip_prefix('/')
            .and_then(|p| p.split_once('/'))
            .filter(|(c, o)| !c.is_empty() && !o.is_empty())
            .ok_or_else(|| Error::InvalidManifest(format!("bad segment path {:?}", self.path)))?;
        let range = match self.range.as_deref() {
            None | Some("") => SegmentRange::full(),
            Some(raw) => SegmentRange::parse(raw)
                .ok_or_else(|| Error::InvalidManifest(format!("bad range {raw:?}")))?,
        };
        Ok(SegmentInfo::Object(ObjectSegment {
            object: account.container(container).object(object),
            size_bytes: self.size_bytes,
            etag: self.etag,
            range,
        }))
    }
}

/// The segment container and prefix implied by existing segments.
///
/// The container is the one holding most object segments (the earliest one
/// wins a tie). The prefix is the longest common prefix of the segment
/// names in that container, cut back to its last `/` if it has one.
/// Returns `None` if there are no object segments.
pub(crate) fn infer_location(segments: &[SegmentInfo]) -> Option<(String, String)> {
    let mut votes: Vec<(&str, usize)> = Vec::new();
    for object in segments.iter().filter_map(SegmentInfo::object) {
        let name = object.container().name();
        match votes.iter_mut().find(|(c, _)| *c == name) {
            Some((_, count)) => *count += 1,
            None => votes.push((name, 1)),
        }
    }
    let mut winner = votes.first()?;
    for candidate in &votes[1..] {
        if candidate.1 > winner.1 {
            winner = candidate;
        }
    }
    let container = winner.0;

    let mut names = segments
        .iter()
        .filter_map(SegmentInfo::object)
        .filter(|o| o.container().name() == container)
        .map(|o| o.name());
    let first = names.next()?;
    let mut prefix_len = first.len();
    for name in names {
        prefix_len = common_prefix_len(&first[..prefix_len], name);
    }
    let mut prefix = &first[..prefix_len];
    if let Some(slash) = prefix.rfind('/') {
        prefix = &prefix[..=slash];
    }
    Some((container.to_owned(), prefix.to_owned()))
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}
