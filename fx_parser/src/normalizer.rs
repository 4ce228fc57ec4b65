//! Orientation of cross-rate candidates.
//!
//! Pairs involving the local currency pass through. For every other pair the
//! anchor currency must be `currency_b`; a candidate quoted the other way round
//! has its currencies and its prices swapped together. Cross pairs without the
//! anchor cannot satisfy that and are rejected.

use crate::grammar::ChannelGrammar;
use crate::model::Candidate;

/// Outcome of normalizing one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Pair with the local currency, unchanged.
    Local(Candidate),
    /// Cross pair oriented as `(other, anchor)` and carrying the marker comment.
    Cross(Candidate),
    /// Cross pair that does not involve the anchor.
    Unanchored(Candidate),
}

impl Normalized {
    /// The candidate ready for change detection, if any.
    pub fn accepted(self) -> Option<Candidate> {
        match self {
            Normalized::Local(c) | Normalized::Cross(c) => Some(c),
            Normalized::Unanchored(_) => None,
        }
    }
}

/// Normalizes a candidate against the grammar's local and anchor currencies.
pub fn normalize(mut candidate: Candidate, grammar: &ChannelGrammar) -> Normalized {
    if !grammar.is_cross(candidate.currency_a, candidate.currency_b) {
        return Normalized::Local(candidate);
    }

    let anchor = grammar.anchor_currency();
    if candidate.currency_a == anchor {
        std::mem::swap(&mut candidate.currency_a, &mut candidate.currency_b);
        std::mem::swap(&mut candidate.buy, &mut candidate.sell);
    } else if candidate.currency_b != anchor {
        return Normalized::Unanchored(candidate);
    }

    candidate.comment = cross_comment(grammar, &candidate.comment);
    Normalized::Cross(candidate)
}

fn cross_comment(grammar: &ChannelGrammar, text: &str) -> String {
    let marker = grammar.cross_rate_marker();
    let text = text.trim();
    if grammar.preserve_cross_comment() && !text.is_empty() {
        format!("{}, {}", marker, text)
    } else {
        marker.to_string()
    }
}
