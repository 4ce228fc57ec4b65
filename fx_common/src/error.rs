//! Error types shared across the workspace.
//!
//! The `ParserError` enum unifies the failure cases of the quote pipeline:
//! file and storage I/O, grammar configuration, serialization, and the
//! per-channel history/emission boundaries. Absence of a match in a message
//! is never an error; only I/O and configuration failures surface here.
use std::io;

use thiserror::Error;

/// Unified error type shared by the parser engine and the runner.
#[derive(Error, Debug)]
pub enum ParserError {
    /// I/O error originating from the standard library (raw logs, CSV files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Invalid channel grammar (missing captures, bad constants, duplicates).
    #[error("Grammar config error: {0}")]
    Config(String),

    /// A rule or exclude pattern failed to compile.
    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Failure while reading or writing CSV records.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A currency code outside the supported set.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// A channel was requested that has no grammar configured.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Seeding the change state from history failed for a channel.
    #[error("History fetch failed: {0}")]
    History(String),

    /// The sink rejected or failed to persist accepted quotes.
    #[error("Emission failed: {0}")]
    Emit(String),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),
}
