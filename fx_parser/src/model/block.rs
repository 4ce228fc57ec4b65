//! Message block after metadata extraction.

use chrono::NaiveDateTime;
use fx_common::Quote;

use crate::model::candidate::Candidate;

/// One message of a channel log with its identity and time fields resolved.
///
/// Lines borrow from the raw log and exclude the `[MARKER]` header lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock<'a> {
    /// Message identifier from the `[MESSAGE_ID]` marker.
    pub message_id: u64,
    /// Version label from the `[VERSION]` marker.
    pub version: String,
    /// Publication time from the `[DATE]` marker.
    pub published: NaiveDateTime,
    /// Edit time from the `[EDITED]` marker, or `published`.
    pub edited: NaiveDateTime,
    /// Message body lines.
    pub lines: Vec<&'a str>,
}

impl RawBlock<'_> {
    /// Stamps a normalized candidate with this block's identity.
    pub fn quote(&self, channel: &str, candidate: Candidate) -> Quote {
        Quote {
            channel: channel.to_string(),
            message_id: self.message_id,
            version: self.version.clone(),
            published: self.published,
            edited: self.edited,
            currency_a: candidate.currency_a,
            currency_b: candidate.currency_b,
            buy: candidate.buy,
            sell: candidate.sell,
            comment: candidate.comment,
        }
    }
}
