//! Change detection over the last-known rate of every quote identity.
//!
//! A quote is accepted when its key is unseen or either price differs from the
//! stored one at four decimal places. Accepting updates the state; suppressing
//! leaves it alone. The state is seeded once from history and then owned by a
//! single channel run.

use std::collections::HashMap;

use fx_common::{Currency, Quote};

/// Dedup identity of a quote, independent of the message it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteKey {
    /// Base currency.
    pub currency_a: Currency,
    /// Quote currency.
    pub currency_b: Currency,
    /// Trimmed, lower-cased comment when the channel keys on it.
    pub comment: Option<String>,
}

impl QuoteKey {
    /// Builds a key, folding the comment in only when `comment_in_key` is set.
    pub fn new(currency_a: Currency, currency_b: Currency, comment: &str, comment_in_key: bool) -> Self {
        Self {
            currency_a,
            currency_b,
            comment: comment_in_key.then(|| comment.trim().to_lowercase()),
        }
    }

    /// Key of an emitted or persisted quote.
    pub fn for_quote(quote: &Quote, comment_in_key: bool) -> Self {
        Self::new(quote.currency_a, quote.currency_b, &quote.comment, comment_in_key)
    }
}

/// Last accepted buy/sell pair of a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    /// Buy price.
    pub buy: f64,
    /// Sell price.
    pub sell: f64,
}

impl Rate {
    /// True if both prices agree at four decimal places.
    pub fn same_as(&self, other: &Rate) -> bool {
        round4(self.buy) == round4(other.buy) && round4(self.sell) == round4(other.sell)
    }
}

fn round4(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

/// Verdict on one observed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// New or changed; the state now holds the observed rate.
    Accepted,
    /// Same as the stored rate.
    Suppressed,
}

/// Last-known rate per key for one channel.
#[derive(Debug, Clone, Default)]
pub struct ChangeState {
    rates: HashMap<QuoteKey, Rate>,
}

impl ChangeState {
    /// Empty state: every key is unseen.
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded from persisted history.
    pub fn seeded(history: HashMap<QuoteKey, Rate>) -> Self {
        Self { rates: history }
    }

    /// Compares `rate` with the stored one and records it if it changed.
    pub fn observe(&mut self, key: QuoteKey, rate: Rate) -> Decision {
        match self.rates.get(&key) {
            Some(known) if known.same_as(&rate) => Decision::Suppressed,
            _ => {
                self.rates.insert(key, rate);
                Decision::Accepted
            }
        }
    }

    /// Stored rate of `key`.
    pub fn get(&self, key: &QuoteKey) -> Option<Rate> {
        self.rates.get(key).copied()
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True when no key is known.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
