//! Watch mode: reprocess channels whose raw log changed.
//!
//! Modification times are polled on a `crossbeam_channel::tick`; the loop ends
//! when the shutdown channel fires (Ctrl+C) or is disconnected.
use crate::store::RawDir;
use crossbeam_channel::{Receiver, select, tick};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::time::{Duration, SystemTime};

/// Last seen modification time of each channel's raw log.
pub struct RawWatcher {
    raw: RawDir,
    seen: HashMap<String, Option<SystemTime>>,
}

impl RawWatcher {
    /// Snapshots the current state of every channel's raw log.
    pub fn new(raw: RawDir, channels: &[String]) -> Self {
        let seen = channels
            .iter()
            .map(|ch| (ch.clone(), modified(&raw, ch)))
            .collect();
        Self { raw, seen }
    }

    /// Channels whose raw log appeared or changed since the last call.
    pub fn changed(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for (channel, last) in self.seen.iter_mut() {
            let now = modified(&self.raw, channel);
            if now.is_some() && now != *last {
                debug!("{}: raw log modified", channel);
                changed.push(channel.clone());
            }
            *last = now;
        }
        changed.sort();
        changed
    }
}

fn modified(raw: &RawDir, channel: &str) -> Option<SystemTime> {
    fs::metadata(raw.path(channel)).and_then(|m| m.modified()).ok()
}

/// Polls every `interval` and calls `on_change` with the changed channels.
pub fn watch<F>(mut watcher: RawWatcher, interval: Duration, shutdown: Receiver<()>, mut on_change: F)
where
    F: FnMut(&[String]),
{
    let ticker = tick(interval);
    info!("Watching raw logs every {:?}. Press Ctrl+C to stop.", interval);
    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(ticker) -> _ => {
                let changed = watcher.changed();
                if !changed.is_empty() {
                    info!("Raw logs changed: {}", changed.join(", "));
                    on_change(&changed);
                }
            }
        }
    }
    info!("Watch loop stopping...");
}
