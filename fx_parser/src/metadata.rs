//! Per-block identity and time fields.
//!
//! Header lines carry `[VERSION] v2`, `[DATE] 2025-10-14 09:30:00` and the
//! optional `[EDITED] ...`. The first occurrence of each marker wins. A block
//! without id, version or a parseable publication time is rejected as a whole.
//!
//! The fetcher prepends every edit as a new block, so several versions of one
//! message may be present in any order. [`latest_versions`] keeps the newest.

use chrono::NaiveDateTime;
use fx_common::quote::{TIMESTAMP_FORMAT, version_rank};
use lazy_static::lazy_static;
use regex::Regex;

use crate::model::RawBlock;
use crate::segmenter::{Segment, marker_id};

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"\[VERSION\]\s*(\S+)").expect("Invalid regex pattern");
    static ref DATE_RE: Regex =
        Regex::new(r"\[DATE\]\s*([\d-]+\s[\d:]+)").expect("Invalid regex pattern");
    static ref EDITED_RE: Regex =
        Regex::new(r"\[EDITED\]\s*([\d-]+\s[\d:]+)").expect("Invalid regex pattern");
    /// Any `[UPPER_CASE]` header marker at the start of a line.
    static ref HEADER_RE: Regex =
        Regex::new(r"^\s*\[[A-Z_]+\]").expect("Invalid regex pattern");
}

/// Resolves a segment's metadata, or `None` when a required field is missing.
pub fn extract(segment: Segment<'_>) -> Option<RawBlock<'_>> {
    let mut message_id: Option<u64> = None;
    let mut version: Option<String> = None;
    let mut published: Option<Option<NaiveDateTime>> = None;
    let mut edited: Option<Option<NaiveDateTime>> = None;
    let mut lines = Vec::with_capacity(segment.lines.len());

    for line in segment.lines {
        if message_id.is_none() {
            message_id = marker_id(line);
        }
        if version.is_none() {
            version = capture(&VERSION_RE, line).map(str::to_string);
        }
        if published.is_none() {
            published = capture(&DATE_RE, line).map(parse_timestamp);
        }
        if edited.is_none() {
            edited = capture(&EDITED_RE, line).map(parse_timestamp);
        }
        if !HEADER_RE.is_match(line) {
            lines.push(line);
        }
    }

    let published = published.flatten()?;
    Some(RawBlock {
        message_id: message_id?,
        version: version?,
        published,
        edited: edited.flatten().unwrap_or(published),
        lines,
    })
}

/// Orders blocks by message id and keeps only the latest version of each.
///
/// Versions compare numerically (`v10` after `v9`), then by edit time; on a
/// full tie the block appearing later in the input wins. Returns the kept
/// blocks and the number of superseded ones.
pub fn latest_versions(mut blocks: Vec<RawBlock<'_>>) -> (Vec<RawBlock<'_>>, usize) {
    blocks.sort_by_key(|b| (b.message_id, version_rank(&b.version), b.edited));

    let mut superseded = 0;
    let mut latest: Vec<RawBlock<'_>> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match latest.last_mut() {
            Some(prev) if prev.message_id == block.message_id => {
                *prev = block;
                superseded += 1;
            }
            _ => latest.push(block),
        }
    }
    (latest, superseded)
}

fn capture<'t>(re: &Regex, line: &'t str) -> Option<&'t str> {
    re.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::segment;

    fn block(log: &str) -> Option<RawBlock<'_>> {
        segment(log).into_iter().next().and_then(extract)
    }

    #[test]
    fn test_extracts_all_fields() {
        let log = "[MESSAGE_ID] 42\n[VERSION] v2\n[DATE] 2025-10-14 09:30:00\n\
                   [EDITED] 2025-10-14 10:05:00\n----\nUSD 41.50/41.80";
        let block = block(log).unwrap();
        assert_eq!(block.message_id, 42);
        assert_eq!(block.version, "v2");
        assert_eq!(block.published.to_string(), "2025-10-14 09:30:00");
        assert_eq!(block.edited.to_string(), "2025-10-14 10:05:00");
        assert_eq!(block.lines, vec!["----", "USD 41.50/41.80"]);
    }

    #[test]
    fn test_edited_defaults_to_published() {
        let block = block("[MESSAGE_ID] 1\n[VERSION] v1\n[DATE] 2025-10-14 09:30:00").unwrap();
        assert_eq!(block.edited, block.published);
    }

    #[test]
    fn test_first_marker_wins() {
        let log = "[MESSAGE_ID] 1\n[VERSION] v1\n[DATE] 2025-10-14 09:30:00\n[VERSION] v9";
        assert_eq!(block(log).unwrap().version, "v1");
    }

    #[test]
    fn test_missing_required_field_drops_block() {
        assert!(block("[MESSAGE_ID] 1\n[DATE] 2025-10-14 09:30:00").is_none());
        assert!(block("[MESSAGE_ID] 1\n[VERSION] v1").is_none());
        assert!(block("[VERSION] v1\n[DATE] 2025-10-14 09:30:00").is_none());
    }

    #[test]
    fn test_latest_version_wins_over_log_order() {
        let log = "[MESSAGE_ID] 10\n[VERSION] v2\n[DATE] 2025-10-14 09:30:00\n\
                   [EDITED] 2025-10-14 09:50:00\nUSD 41.60/41.90\n\
                   [MESSAGE_ID] 10\n[VERSION] v1\n[DATE] 2025-10-14 09:30:00\nUSD 41.50/41.80\n\
                   [MESSAGE_ID] 9\n[VERSION] v1\n[DATE] 2025-10-14 09:00:00\nEUR 44.10/44.60";
        let blocks: Vec<RawBlock<'_>> = segment(log).into_iter().filter_map(extract).collect();
        let (latest, superseded) = latest_versions(blocks);
        assert_eq!(superseded, 1);
        let ids: Vec<(u64, &str)> = latest.iter().map(|b| (b.message_id, b.version.as_str())).collect();
        assert_eq!(ids, vec![(9, "v1"), (10, "v2")]);
        assert_eq!(latest[1].lines, vec!["USD 41.60/41.90"]);
    }

    #[test]
    fn test_version_ten_beats_nine() {
        let log = "[MESSAGE_ID] 3\n[VERSION] v10\n[DATE] 2025-10-14 09:00:00\nnew\n\
                   [MESSAGE_ID] 3\n[VERSION] v9\n[DATE] 2025-10-14 09:00:00\nold";
        let blocks: Vec<RawBlock<'_>> = segment(log).into_iter().filter_map(extract).collect();
        let (latest, _) = latest_versions(blocks);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version, "v10");
    }

    #[test]
    fn test_unparseable_date_drops_block() {
        assert!(block("[MESSAGE_ID] 1\n[VERSION] v1\n[DATE] 2025-13-40 99:99:99").is_none());
    }
}
