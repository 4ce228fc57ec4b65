//! Command-line arguments for the FX runner.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding `<CHANNEL>_raw.txt` message logs.
    #[clap(long, default_value = ".")]
    pub raw_dir: String,

    /// Directory receiving `<CHANNEL>_parsed.csv` files (history and output).
    #[clap(long, default_value = ".")]
    pub out_dir: String,

    /// Channels to process, separated by commas. Defaults to every configured channel.
    #[clap(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    /// JSON file with channel grammars; the built-in grammars are used when absent.
    #[clap(long)]
    pub config: Option<String>,

    /// Print accepted quotes as JSON lines instead of appending to CSV.
    #[clap(long)]
    pub dry_run: bool,

    /// Process channels one after another on the main thread.
    #[clap(long)]
    pub sequential: bool,

    /// Keep running and reprocess a channel whenever its raw log changes.
    #[clap(long)]
    pub watch: bool,

    /// Poll interval of watch mode, in seconds.
    #[clap(long, default_value_t = 5)]
    pub interval_secs: u64,
}

impl Args {
    /// Raw log directory with shell quotes stripped.
    pub fn raw_dir(&self) -> PathBuf {
        normalize_path(&self.raw_dir)
    }

    /// Output directory with shell quotes stripped.
    pub fn out_dir(&self) -> PathBuf {
        normalize_path(&self.out_dir)
    }

    /// Grammar config path with shell quotes stripped.
    pub fn config(&self) -> Option<PathBuf> {
        self.config.as_deref().map(normalize_path)
    }
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
pub fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
