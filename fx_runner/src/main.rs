//! FX Runner: drives the quote extraction pipeline over channel log files.
//!
//! For every configured channel it reads `<raw-dir>/<CHANNEL>_raw.txt`, seeds
//! the change detector from `<out-dir>/<CHANNEL>_parsed.csv`, and appends the
//! new or changed quotes to that same CSV file (or prints them as JSON lines
//! with `--dry-run`). Channels run concurrently, one thread each, and report
//! back over a crossbeam channel; a failing channel never stops the others.
//!
//! Usage example (CLI):
//! ```bash
//! fx_runner --raw-dir ./raw --out-dir ./parsed --channels GARANT,UACOIN --watch
//! ```
//!
//! Grammars default to the built-in channels; see `config` for the JSON file
//! format accepted by `--config`.
#![warn(missing_docs)]
mod args;
mod config;
mod store;
mod watcher;

use crate::args::Args;
use crate::store::{CsvStore, JsonLinesSink, RawDir};
use crate::watcher::RawWatcher;
use clap::Parser;
use crossbeam_channel::unbounded;
use fx_common::ParserError;
use fx_common::Result;
use fx_parser::{ChannelGrammar, RunSummary, run_channel};
use log::{error, info};
use std::thread;
use std::time::Duration;

/// Everything a channel run needs besides its grammar.
#[derive(Clone)]
struct RunContext {
    raw: RawDir,
    store: CsvStore,
    dry_run: bool,
}

impl RunContext {
    fn run(&self, grammar: &ChannelGrammar) -> Result<Option<RunSummary>> {
        if self.dry_run {
            run_channel(grammar, &self.raw, &self.store, &mut JsonLinesSink::stdout())
        } else {
            let mut sink = self.store.clone();
            run_channel(grammar, &self.raw, &self.store, &mut sink)
        }
    }
}

/// Runs `grammars` and logs one summary line per channel.
///
/// Returns the number of channels that failed.
fn run_batch(grammars: &[ChannelGrammar], ctx: &RunContext, sequential: bool) -> usize {
    let mut failed = 0;
    if sequential {
        for grammar in grammars {
            if !report(grammar, ctx.run(grammar)) {
                failed += 1;
            }
        }
        return failed;
    }

    let (result_tx, result_rx) = unbounded::<(usize, Result<Option<RunSummary>>)>();
    for (idx, grammar) in grammars.iter().enumerate() {
        let grammar = grammar.clone();
        let ctx = ctx.clone();
        let result_tx = result_tx.clone();
        thread::spawn(move || {
            let outcome = ctx.run(&grammar);
            if let Err(e) = result_tx.send((idx, outcome)) {
                error!("{}: failed to report result: {}", grammar.name(), e);
            }
        });
    }
    drop(result_tx);

    let mut received = 0;
    for (idx, outcome) in result_rx.iter() {
        received += 1;
        if !report(&grammars[idx], outcome) {
            failed += 1;
        }
    }
    failed + grammars.len() - received
}

/// Logs a channel outcome; returns false on error.
fn report(grammar: &ChannelGrammar, outcome: Result<Option<RunSummary>>) -> bool {
    let local = grammar.local_currency();
    match outcome {
        Ok(Some(RunSummary { report: summary, emitted })) => {
            info!(
                "{}: found={} new={} skipped={} local={} cross={} dropped_blocks={} superseded={} noise_lines={} low_confidence={} unanchored={} inserted={} duplicates={}",
                summary.channel,
                summary.found(),
                summary.accepted.len(),
                summary.suppressed,
                summary.local_pairs(local),
                summary.cross_rates(local),
                summary.dropped_blocks,
                summary.superseded,
                summary.noise_lines,
                summary.low_confidence,
                summary.unanchored,
                emitted.inserted,
                emitted.duplicates,
            );
            true
        }
        Ok(None) => true,
        Err(e) => {
            error!("{}: channel failed: {}", grammar.name(), e);
            false
        }
    }
}

fn main() -> Result<(), ParserError> {
    init_logger();
    let args = Args::parse();

    let config = config::load(args.config().as_deref())?;
    let grammars = config.compile(&args.channels)?;
    info!("Loaded {} channel grammars", grammars.len());

    let ctx = RunContext {
        raw: RawDir::new(args.raw_dir()),
        store: CsvStore::new(args.out_dir()),
        dry_run: args.dry_run,
    };

    // Snapshot precedes the first batch; writes landing during it count as changes.
    let names: Vec<String> = grammars.iter().map(|g| g.name().to_string()).collect();
    let watcher = args.watch.then(|| RawWatcher::new(ctx.raw.clone(), &names));

    let failed = run_batch(&grammars, &ctx, args.sequential);
    if failed > 0 {
        error!("{} of {} channels failed", failed, grammars.len());
    }

    if let Some(watcher) = watcher {
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down runner...");
            let _ = shutdown_tx.send(());
        })
        .map_err(|e| ParserError::Format(format!("Error setting Ctrl+C handler: {}", e)))?;

        let interval = Duration::from_secs(args.interval_secs.max(1));
        watcher::watch(watcher, interval, shutdown_rx, |changed| {
            let selected: Vec<ChannelGrammar> = grammars
                .iter()
                .filter(|g| changed.iter().any(|c| c == g.name()))
                .cloned()
                .collect();
            run_batch(&selected, &ctx, args.sequential);
        });
    }

    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
