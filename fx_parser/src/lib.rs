//! FX quote extraction engine.
//!
//! Turns the raw message log of an exchange channel into a feed of buy/sell
//! quotes, emitting only quotes that are new or changed since they were last
//! seen. The pipeline is built from small stages:
//!
//! - `segmenter`: cuts the log into message blocks and orders them by id.
//! - `metadata`: resolves id, version and timestamps of each block.
//! - `noise`: drops promotional and contact lines.
//! - `grammar` / `extractor`: data-driven per-channel rules producing candidates.
//! - `normalizer`: orients cross-rate pairs onto the anchor currency.
//! - `change`: per-key last-known rates and the accept/suppress decision.
//! - `source`: raw text, history and sink boundaries, plus an in-memory store.
//! - `pipeline`: drives one channel end to end and reports counters.
//! - `channels`: grammars of the built-in channels.
#![warn(missing_docs)]

pub mod change;
pub mod channels;
pub mod extractor;
pub mod grammar;
pub mod metadata;
pub mod model;
pub mod noise;
pub mod normalizer;
pub mod pipeline;
pub mod segmenter;
pub mod source;

pub use change::{ChangeState, Decision, QuoteKey, Rate};
pub use grammar::{ChannelGrammar, GrammarSpec, RuleSpec};
pub use pipeline::{ChannelReport, RunSummary, process_text, run_channel};
pub use source::{EmitOutcome, History, HistorySource, MemoryStore, QuoteSink, RawTextSource};
