//! File-backed raw logs, CSV history and output sinks.
//!
//! - `RawDir` reads `<dir>/<CHANNEL>_raw.txt` as written by the fetcher.
//! - `CsvStore` is both the history source and the sink over
//!   `<dir>/<CHANNEL>_parsed.csv`, one row per quote in `Quote` field order.
//! - `JsonLinesSink` prints quotes instead of persisting them.
use fx_common::quote::version_rank;
use fx_common::{Quote, Result};
use fx_parser::source::{History, HistorySource, QuoteSink, RawTextSource, history_from_quotes, row_identity};
use fx_parser::{ChannelGrammar, EmitOutcome};
use log::debug;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Directory of raw channel logs.
#[derive(Debug, Clone)]
pub struct RawDir {
    dir: PathBuf,
}

impl RawDir {
    /// Raw logs under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Location of the raw log of `channel`.
    pub fn path(&self, channel: &str) -> PathBuf {
        self.dir.join(format!("{}_raw.txt", channel))
    }
}

impl RawTextSource for RawDir {
    fn raw_text(&self, channel: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(channel)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Per-channel CSV files of accepted quotes.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Store under `dir`; the directory is created on first insert.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Location of the parsed file of `channel`.
    pub fn path(&self, channel: &str) -> PathBuf {
        self.dir.join(format!("{}_parsed.csv", channel))
    }

    /// Every persisted quote of `channel` in file order; empty if no file yet.
    pub fn read_quotes(&self, channel: &str) -> Result<Vec<Quote>> {
        let path = self.path(channel);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut quotes = Vec::new();
        for row in reader.deserialize() {
            quotes.push(row?);
        }
        Ok(quotes)
    }
}

fn is_empty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

impl HistorySource for CsvStore {
    fn history(&self, grammar: &ChannelGrammar) -> Result<History> {
        let quotes = self.read_quotes(grammar.name())?;
        Ok(history_from_quotes(&quotes, grammar))
    }
}

impl QuoteSink for CsvStore {
    fn insert(&mut self, channel: &str, quotes: &[Quote]) -> Result<EmitOutcome> {
        let mut seen: HashSet<_> = self.read_quotes(channel)?.iter().map(row_identity).collect();
        let mut fresh: Vec<&Quote> = Vec::with_capacity(quotes.len());
        let mut outcome = EmitOutcome::default();
        for quote in quotes {
            if seen.insert(row_identity(quote)) {
                fresh.push(quote);
            } else {
                outcome.duplicates += 1;
            }
        }
        if fresh.is_empty() {
            return Ok(outcome);
        }
        fresh.sort_by_key(|q| (q.message_id, version_rank(&q.version)));

        fs::create_dir_all(&self.dir)?;
        let path = self.path(channel);
        let write_header = is_empty_file(&path);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for quote in &fresh {
            writer.serialize(quote)?;
        }
        writer.flush()?;

        outcome.inserted = fresh.len();
        debug!("{}: appended {} rows to {}", channel, outcome.inserted, path.display());
        Ok(outcome)
    }
}

/// Sink printing one JSON object per quote.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl JsonLinesSink<io::Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> QuoteSink for JsonLinesSink<W> {
    fn insert(&mut self, _channel: &str, quotes: &[Quote]) -> Result<EmitOutcome> {
        let mut buf = String::new();
        for quote in quotes {
            buf.push_str(&quote.to_json_line()?);
            buf.push('\n');
        }
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        Ok(EmitOutcome {
            inserted: quotes.len(),
            duplicates: 0,
        })
    }
}
