//! Quote candidate produced by a single extraction rule.

use fx_common::Currency;

/// A validated but not yet deduplicated quote.
///
/// Prices are strictly positive and the two currencies differ; the extractor
/// never builds a candidate that breaks either.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Base currency.
    pub currency_a: Currency,
    /// Quote currency.
    pub currency_b: Currency,
    /// Buy price.
    pub buy: f64,
    /// Sell price.
    pub sell: f64,
    /// Trailing free text of the line, trimmed.
    pub comment: String,
    /// Set when a flag pair and an explicit code disagreed.
    pub low_confidence: bool,
}
