//! Per-channel driver: segment, extract, normalize, dedup, emit.

use fx_common::{Currency, ParserError, Quote, Result};
use log::{debug, info, warn};

use crate::change::{ChangeState, Decision, QuoteKey, Rate};
use crate::extractor::extract_block;
use crate::grammar::ChannelGrammar;
use crate::metadata;
use crate::normalizer::{Normalized, normalize};
use crate::segmenter::segment;
use crate::source::{EmitOutcome, HistorySource, QuoteSink, RawTextSource};

/// Counters and accepted quotes of one channel pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelReport {
    /// Channel name.
    pub channel: String,
    /// Quotes accepted by the change detector, in block order.
    pub accepted: Vec<Quote>,
    /// Candidates equal to the last-known rate.
    pub suppressed: usize,
    /// Message segments seen, including dropped ones. Lines before the first
    /// `[MESSAGE_ID]` marker are a log preamble and not counted.
    pub blocks: usize,
    /// Segments dropped for missing metadata.
    pub dropped_blocks: usize,
    /// Blocks replaced by a later version of the same message.
    pub superseded: usize,
    /// Lines removed by the noise filter.
    pub noise_lines: usize,
    /// Candidates whose flags and code disagreed.
    pub low_confidence: usize,
    /// Cross pairs discarded for not involving the anchor.
    pub unanchored: usize,
}

impl ChannelReport {
    /// Candidates that reached the change detector.
    pub fn found(&self) -> usize {
        self.accepted.len() + self.suppressed
    }

    /// Accepted quotes not involving `local`.
    pub fn cross_rates(&self, local: Currency) -> usize {
        self.accepted
            .iter()
            .filter(|q| q.currency_a != local && q.currency_b != local)
            .count()
    }

    /// Accepted quotes involving `local`.
    pub fn local_pairs(&self, local: Currency) -> usize {
        self.accepted.len() - self.cross_rates(local)
    }
}

/// Runs the core pipeline over a raw log against a caller-owned state.
///
/// Only the latest version of each message is processed. Messages run in
/// ascending id, so a later message wins when it carries a different rate for
/// the same key.
pub fn process_text(grammar: &ChannelGrammar, text: &str, state: &mut ChangeState) -> ChannelReport {
    let channel = grammar.name();
    let mut report = ChannelReport {
        channel: channel.to_string(),
        ..ChannelReport::default()
    };

    let mut blocks = Vec::new();
    for seg in segment(text) {
        if seg.message_id().is_none() {
            continue;
        }
        report.blocks += 1;
        match metadata::extract(seg) {
            Some(block) => blocks.push(block),
            None => report.dropped_blocks += 1,
        }
    }
    let (blocks, superseded) = metadata::latest_versions(blocks);
    report.superseded = superseded;

    for block in blocks {
        let extraction = extract_block(grammar, &block.lines);
        report.noise_lines += extraction.noise_lines;

        for candidate in extraction.candidates {
            if candidate.low_confidence {
                report.low_confidence += 1;
                warn!(
                    "{}: message {} flags and code disagree, kept {}/{}",
                    channel, block.message_id, candidate.currency_a, candidate.currency_b
                );
            }

            let candidate = match normalize(candidate, grammar) {
                Normalized::Local(c) | Normalized::Cross(c) => c,
                Normalized::Unanchored(c) => {
                    report.unanchored += 1;
                    debug!(
                        "{}: message {} cross pair {}/{} lacks anchor {}",
                        channel,
                        block.message_id,
                        c.currency_a,
                        c.currency_b,
                        grammar.anchor_currency()
                    );
                    continue;
                }
            };

            let key = QuoteKey::new(
                candidate.currency_a,
                candidate.currency_b,
                &candidate.comment,
                grammar.comment_in_key(),
            );
            let rate = Rate {
                buy: candidate.buy,
                sell: candidate.sell,
            };
            match state.observe(key, rate) {
                Decision::Accepted => report.accepted.push(block.quote(channel, candidate)),
                Decision::Suppressed => report.suppressed += 1,
            }
        }
    }

    if report.dropped_blocks > 0 {
        debug!("{}: dropped {} blocks without metadata", channel, report.dropped_blocks);
    }
    if report.superseded > 0 {
        debug!("{}: skipped {} superseded versions", channel, report.superseded);
    }
    report
}

/// Result of a full channel run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Pipeline counters and accepted quotes.
    pub report: ChannelReport,
    /// What the sink did with the accepted quotes.
    pub emitted: EmitOutcome,
}

/// Reads, seeds, processes and emits one channel.
///
/// Returns `Ok(None)` when the channel has no raw log. A history failure aborts
/// the channel before any processing. An emission failure is returned as
/// is; the state built during the run is not rolled back.
pub fn run_channel<R, H, S>(
    grammar: &ChannelGrammar,
    raw: &R,
    history: &H,
    sink: &mut S,
) -> Result<Option<RunSummary>>
where
    R: RawTextSource + ?Sized,
    H: HistorySource + ?Sized,
    S: QuoteSink + ?Sized,
{
    let channel = grammar.name();
    let Some(text) = raw.raw_text(channel)? else {
        warn!("{}: no raw log, skipping", channel);
        return Ok(None);
    };

    let seed = history
        .history(grammar)
        .map_err(|e| ParserError::History(format!("{}: {}", channel, e)))?;
    info!("{}: seeded {} known rates", channel, seed.len());
    let mut state = ChangeState::seeded(seed);

    let report = process_text(grammar, &text, &mut state);
    let emitted = if report.accepted.is_empty() {
        EmitOutcome::default()
    } else {
        sink.insert(channel, &report.accepted)
            .map_err(|e| ParserError::Emit(format!("{}: {}", channel, e)))?
    };

    Ok(Some(RunSummary { report, emitted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels;
    use crate::source::MemoryStore;

    const LOG: &str = "[MESSAGE_ID] 10\n[VERSION] v1\n[DATE] 2025-10-14 09:30:00\nUSD 41.50/41.80\n";

    fn garant() -> ChannelGrammar {
        channels::builtin("GARANT").unwrap()
    }

    struct FailingHistory;

    impl HistorySource for FailingHistory {
        fn history(&self, _grammar: &ChannelGrammar) -> Result<crate::source::History> {
            Err(ParserError::Format("backend down".to_string()))
        }
    }

    struct FailingSink;

    impl QuoteSink for FailingSink {
        fn insert(&mut self, _channel: &str, _quotes: &[Quote]) -> Result<EmitOutcome> {
            Err(ParserError::Format("disk full".to_string()))
        }
    }

    #[test]
    fn test_missing_raw_log_skips_channel() {
        let mut store = MemoryStore::new();
        let raw = MemoryStore::new();
        assert_eq!(run_channel(&garant(), &raw, &raw, &mut store).unwrap(), None);
    }

    #[test]
    fn test_run_emits_and_replays_idempotently() {
        let raw = MemoryStore::new().with_raw("GARANT", LOG);
        let mut store = MemoryStore::new();

        let first = run_channel(&garant(), &raw, &store.clone(), &mut store).unwrap().unwrap();
        assert_eq!(first.report.accepted.len(), 1);
        assert_eq!(first.emitted.inserted, 1);

        let second = run_channel(&garant(), &raw, &store.clone(), &mut store).unwrap().unwrap();
        assert!(second.report.accepted.is_empty());
        assert_eq!(second.report.suppressed, 1);
        assert_eq!(second.emitted, EmitOutcome::default());
    }

    #[test]
    fn test_history_failure_is_channel_error() {
        let raw = MemoryStore::new().with_raw("GARANT", LOG);
        let mut store = MemoryStore::new();
        let err = run_channel(&garant(), &raw, &FailingHistory, &mut store).unwrap_err();
        assert!(matches!(err, ParserError::History(_)));
        assert!(store.quotes("GARANT").is_empty());
    }

    #[test]
    fn test_emit_failure_is_channel_error() {
        let raw = MemoryStore::new().with_raw("GARANT", LOG);
        let err = run_channel(&garant(), &raw, &raw, &mut FailingSink).unwrap_err();
        assert!(matches!(err, ParserError::Emit(_)));
    }

    #[test]
    fn test_report_splits_local_and_cross() {
        let log = "[MESSAGE_ID] 1\n[VERSION] v1\n[DATE] 2025-10-14 09:30:00\n\
                   USD 41.50/41.80\nEUR/USD 1.0800/1.0850\n";
        let report = process_text(&garant(), log, &mut ChangeState::new());
        assert_eq!(report.found(), 2);
        assert_eq!(report.local_pairs(Currency::UAH), 1);
        assert_eq!(report.cross_rates(Currency::UAH), 1);
    }
}
