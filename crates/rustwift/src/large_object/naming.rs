//! Segment object names.
//!
//! Segments are named `<prefix><counter>`, the counter being a zero-padded
//! 16-digit decimal starting at 1. The next name is derived from the last
//! existing one by incrementing its numeric suffix.

use std::sync::LazyLock;

use regex::Regex;

static NUMERIC_SUFFIX_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)([0-9]+)$").expect("suffix regex is valid"));

/// Counter of the first segment.
pub(crate) const INITIAL_COUNTER: &str = "0000000000000001";

/// The name of the first segment below `prefix`.
pub(crate) fn first_segment_name(prefix: &str) -> String {
    format!("{prefix}{INITIAL_COUNTER}")
}

/// The name following `previous`: its numeric suffix incremented with the
/// width preserved (growing only on overflow, as in `9999` to `10000`).
/// Names without a usable suffix get a fresh counter appended.
pub(crate) fn next_segment_name(previous: &str) -> String {
    let Some(caps) = NUMERIC_SUFFIX_RX.captures(previous) else {
        return format!("{previous}{INITIAL_COUNTER}");
    };
    let (stem, digits) = (&caps[1], &caps[2]);
    match digits.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => format!("{stem}{next:0width$}", width = digits.len()),
        None => format!("{previous}-{INITIAL_COUNTER}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_increment_counter_keeping_width() {
        assert_eq!(next_segment_name("seg/0000000000000001"), "seg/0000000000000002");
        assert_eq!(next_segment_name("part-0099"), "part-0100");
        assert_eq!(next_segment_name("9999"), "10000");
        assert_eq!(next_segment_name("a1b2"), "a1b3");
    }

    #[test]
    fn test_should_append_counter_without_numeric_suffix() {
        assert_eq!(next_segment_name("segment"), "segment0000000000000001");
        assert_eq!(next_segment_name(""), "0000000000000001");
    }

    #[test]
    fn test_should_branch_off_on_overflow() {
        let max = u64::MAX.to_string();
        assert_eq!(next_segment_name(&max), format!("{max}-0000000000000001"));
        let huge = "123456789012345678901234567890";
        assert_eq!(next_segment_name(huge), format!("{huge}-0000000000000001"));
    }

    #[test]
    fn test_should_build_first_name() {
        assert_eq!(first_segment_name("foo/bar/"), "foo/bar/0000000000000001");
    }
}
