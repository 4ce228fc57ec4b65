//! Block segmentation of a channel's raw message log.
//!
//! The fetcher writes every message (and every new version of an edited
//! message) as a block introduced by a `[MESSAGE_ID] <n>` marker. Newest
//! blocks are prepended, so the log is usually reverse-chronological; edits
//! interleave. Segmentation only cuts the log at markers and re-sorts the
//! pieces by message id; picking the latest version of an edited message
//! needs the `[VERSION]` marker and happens after metadata extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Body written by the fetcher for messages without text.
pub const NO_TEXT_PLACEHOLDER: &str = "[NO TEXT]";

lazy_static! {
    /// Block-start marker carrying the message id.
    pub(crate) static ref MESSAGE_ID_RE: Regex =
        Regex::new(r"\[MESSAGE_ID\]\s*(\d+)").expect("Invalid regex pattern");
}

/// Consecutive lines of the log belonging to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Lines in log order, markers included.
    pub lines: Vec<&'a str>,
}

impl Segment<'_> {
    /// Message id of the first marker in the segment.
    pub fn message_id(&self) -> Option<u64> {
        self.lines.iter().find_map(|line| marker_id(line))
    }
}

/// Parses the message id out of a `[MESSAGE_ID]` marker line.
pub fn marker_id(line: &str) -> Option<u64> {
    MESSAGE_ID_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Splits `text` into segments sorted ascending by message id.
///
/// A marker starts a new segment unless the current one is still empty, so
/// lines preceding the first marker form their own id-less segment. The sort
/// is stable: id-less segments come first, and blocks sharing an id keep their
/// log order.
pub fn segment(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim() == NO_TEXT_PLACEHOLDER {
            continue;
        }
        if MESSAGE_ID_RE.is_match(line) && !current.is_empty() {
            segments.push(Segment {
                lines: std::mem::take(&mut current),
            });
        }
        current.push(line);
    }
    if !current.is_empty() {
        segments.push(Segment { lines: current });
    }

    segments.sort_by_cached_key(|segment| segment.message_id());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuts_at_markers_and_sorts() {
        let log = "[MESSAGE_ID] 7\nUSD 41.60/41.90\n[MESSAGE_ID] 5\nUSD 41.50/41.80\n";
        let segments = segment(log);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].message_id(), Some(5));
        assert_eq!(segments[0].lines, vec!["[MESSAGE_ID] 5", "USD 41.50/41.80"]);
        assert_eq!(segments[1].message_id(), Some(7));
    }

    #[test]
    fn test_leading_lines_form_idless_segment() {
        let log = "=====\n[CHANNEL] GARANT\n[MESSAGE_ID] 3\nbody";
        let segments = segment(log);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].message_id(), None);
        assert_eq!(segments[1].lines, vec!["[MESSAGE_ID] 3", "body"]);
    }

    #[test]
    fn test_trailing_block_is_emitted() {
        let segments = segment("[MESSAGE_ID] 1\nfirst\n[MESSAGE_ID] 2\nunterminated");
        assert_eq!(segments.last().unwrap().lines, vec!["[MESSAGE_ID] 2", "unterminated"]);
    }

    #[test]
    fn test_every_line_lands_in_one_block() {
        let log = "a\n[MESSAGE_ID] 9\nb\nc\n[MESSAGE_ID] 4\nd";
        let total: usize = segment(log).iter().map(|s| s.lines.len()).sum();
        assert_eq!(total, log.lines().count());
    }

    #[test]
    fn test_drops_no_text_placeholder() {
        let segments = segment("[MESSAGE_ID] 1\n[NO TEXT]\n");
        assert_eq!(segments[0].lines, vec!["[MESSAGE_ID] 1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
    }
}
