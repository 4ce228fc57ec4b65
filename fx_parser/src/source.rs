//! Boundaries between the pipeline and the outside world.
//!
//! The pipeline reads a channel's raw log, seeds its change state from history
//! and hands accepted quotes to a sink. Each boundary is a trait so the runner
//! can plug in files while tests use [`MemoryStore`].

use std::collections::{HashMap, HashSet};

use fx_common::{Currency, Quote, Result};

use crate::change::{QuoteKey, Rate};
use crate::grammar::ChannelGrammar;

/// Last-known rate per key, as loaded from persistence.
pub type History = HashMap<QuoteKey, Rate>;

/// Counts reported by a sink after an insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOutcome {
    /// Rows written.
    pub inserted: usize,
    /// Rows already present at the storage layer.
    pub duplicates: usize,
}

/// Provider of a channel's raw message log.
pub trait RawTextSource {
    /// Raw text of `channel`, or `None` when no log exists yet.
    fn raw_text(&self, channel: &str) -> Result<Option<String>>;
}

/// Provider of the persisted last-known rates.
pub trait HistorySource {
    /// Seed for the channel's change state, keyed by its identity policy.
    fn history(&self, grammar: &ChannelGrammar) -> Result<History>;
}

/// Destination of accepted quotes.
pub trait QuoteSink {
    /// Persists `quotes`, skipping rows the store already holds.
    fn insert(&mut self, channel: &str, quotes: &[Quote]) -> Result<EmitOutcome>;
}

/// Folds persisted quotes into a history; later quotes overwrite earlier ones.
pub fn history_from_quotes<'q, I>(quotes: I, grammar: &ChannelGrammar) -> History
where
    I: IntoIterator<Item = &'q Quote>,
{
    quotes
        .into_iter()
        .map(|q| {
            (
                QuoteKey::for_quote(q, grammar.comment_in_key()),
                Rate {
                    buy: q.buy,
                    sell: q.sell,
                },
            )
        })
        .collect()
}

/// Storage-level identity of a persisted row.
pub type RowIdentity = (String, u64, String, Currency, Currency, String);

/// Identity used by sinks to recognise a row they already hold.
pub fn row_identity(quote: &Quote) -> RowIdentity {
    (
        quote.channel.clone(),
        quote.message_id,
        quote.version.clone(),
        quote.currency_a,
        quote.currency_b,
        quote.comment.trim().to_lowercase(),
    )
}

/// In-memory raw logs and quote store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: HashMap<String, String>,
    quotes: HashMap<String, Vec<Quote>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw log of `channel`.
    pub fn with_raw(mut self, channel: &str, text: &str) -> Self {
        self.raw.insert(channel.to_string(), text.to_string());
        self
    }

    /// Quotes stored for `channel`, in insertion order.
    pub fn quotes(&self, channel: &str) -> &[Quote] {
        self.quotes.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RawTextSource for MemoryStore {
    fn raw_text(&self, channel: &str) -> Result<Option<String>> {
        Ok(self.raw.get(channel).cloned())
    }
}

impl HistorySource for MemoryStore {
    fn history(&self, grammar: &ChannelGrammar) -> Result<History> {
        Ok(history_from_quotes(self.quotes(grammar.name()), grammar))
    }
}

impl QuoteSink for MemoryStore {
    fn insert(&mut self, channel: &str, quotes: &[Quote]) -> Result<EmitOutcome> {
        let stored = self.quotes.entry(channel.to_string()).or_default();
        let mut seen: HashSet<RowIdentity> = stored.iter().map(row_identity).collect();
        let mut outcome = EmitOutcome::default();
        for quote in quotes {
            if seen.insert(row_identity(quote)) {
                stored.push(quote.clone());
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        Ok(outcome)
    }
}
