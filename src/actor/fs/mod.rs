//! FileSystem Actor
//!
//! Watches directories and hands debounced change batches to a callback.
//! Used for a oneshot target's sources, a resident target's output
//! directory, and the renderer root.
//!
//! Architecture:
//! ```text
//! notify → channel → watch thread → Debouncer (pure timing) → on_batch
//! ```
//!
//! The watcher is attached before `spawn` returns, so nothing written after
//! that point is missed.

use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;


use debouncer::Debouncer;
pub use types::ChangeBatch;

/// What to watch and how to debounce it.
#[derive(Debug, Clone)]
pub struct WatchSpec {
    /// Log prefix and thread name
    pub label: &'static str,
    /// Directories watched recursively
    pub roots: Vec<PathBuf>,
    /// Directories whose events are dropped
    pub ignore: Vec<PathBuf>,
    /// Quiet period before a batch is released
    pub debounce: Duration,
    /// Deliver an empty batch as soon as the thread starts
    pub initial_batch: bool,
}

/// Input of the watch thread.
enum WatchEvent {
    Notify(notify::Result<notify::Event>),
    Stop,
}

/// FileSystem Actor - runs one watch thread
pub struct FsActor {
    /// Kept alive for as long as the thread runs
    _watcher: RecommendedWatcher,
    events: Receiver<WatchEvent>,
    debouncer: Debouncer,
    label: &'static str,
    initial_batch: bool,
}

/// Handle to a running watch thread.
pub struct FsHandle {
    tx: Sender<WatchEvent>,
    thread: Option<JoinHandle<()>>,
}

impl FsActor {
    /// Attach the watcher and start the watch thread.
    ///
    /// `on_batch` runs on the watch thread; returning `false` stops watching
    /// (the receiving side is gone).
    pub fn spawn<F>(spec: WatchSpec, on_batch: F) -> Result<FsHandle>
    where
        F: FnMut(ChangeBatch) -> bool + Send + 'static,
    {
        let (tx, events) = channel::unbounded();

        let notify_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(WatchEvent::Notify(res));
        })
        .context("failed to create file watcher")?;

        for root in &spec.roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", root.display()))?;
            crate::debug!("watch"; "{}: {}", spec.label, root.display());
        }

        let actor = Self {
            _watcher: watcher,
            events,
            debouncer: Debouncer::new(spec.debounce).ignoring(&spec.ignore),
            label: spec.label,
            initial_batch: spec.initial_batch,
        };

        let thread = std::thread::Builder::new()
            .name(format!("watch-{}", spec.label))
            .spawn(move || actor.run(on_batch))
            .context("failed to spawn watch thread")?;

        Ok(FsHandle {
            tx,
            thread: Some(thread),
        })
    }

    fn run<F>(mut self, mut on_batch: F)
    where
        F: FnMut(ChangeBatch) -> bool,
    {
        if self.initial_batch && !on_batch(ChangeBatch::default()) {
            return;
        }

        loop {
            match self.events.recv_timeout(self.debouncer.sleep_duration()) {
                Ok(WatchEvent::Notify(Ok(event))) => self.debouncer.add_event(&event),
                Ok(WatchEvent::Notify(Err(e))) => {
                    crate::log!("watch"; "{}: notify error: {}", self.label, e);
                }
                Ok(WatchEvent::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(batch) = self.debouncer.take_if_ready() {
                        crate::debug!("watch"; "{}: {}", self.label, batch.summary());
                        if !on_batch(batch) {
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl FsHandle {
    /// Stop the watch thread and wait for it to exit.
    ///
    /// A callback that is mid-way (e.g. a running oneshot build) finishes
    /// first; callers terminate such work before stopping.
    pub fn stop(mut self) {
        let _ = self.tx.send(WatchEvent::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for FsHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(WatchEvent::Stop);
    }
}
