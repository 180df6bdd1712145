//! `oneshot` strategy: devwatch watches the sources itself.
//!
//! The command runs once at start and once per debounced change batch, on
//! the watch thread, so at most one build runs at a time. Events under the
//! target's own `out_dir` are dropped; otherwise a bundle written inside a
//! watched root would trigger the next build forever.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::{BuildOutcome, BuildTool, WatchHandle, ensure_program};
use crate::actor::fs::{ChangeBatch, FsActor, WatchSpec};
use crate::actor::messages::PipelineMsg;
use crate::config::{Section, TargetConfig};
use crate::process::terminate_group;
use crate::utils::exec::{Cmd, describe_failure};

pub struct Oneshot {
    section: Section,
    config: TargetConfig,
}

impl Oneshot {
    pub fn new(section: Section, config: TargetConfig) -> Self {
        Self { section, config }
    }
}

impl BuildTool for Oneshot {
    fn watch(self: Box<Self>, events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle> {
        let name = self.section.name();
        let config = self.config;
        let cwd = config
            .cwd
            .clone()
            .unwrap_or_else(|| Path::new(".").to_path_buf());

        ensure_program(self.section, &config.command, &cwd)?;

        // pid of the build in flight, 0 when idle
        let current = Arc::new(AtomicU32::new(0));
        let stopping = Arc::new(AtomicBool::new(false));

        let mut rebuilder = Rebuilder {
            name,
            command: config.command.clone(),
            cwd,
            current: Arc::clone(&current),
            stopping: Arc::clone(&stopping),
            events,
        };
        let fs = FsActor::spawn(
            WatchSpec {
                label: name,
                roots: config.watch.clone(),
                ignore: vec![config.out_dir.clone()],
                debounce: Duration::from_millis(config.debounce_ms),
                initial_batch: true,
            },
            move |batch| rebuilder.on_batch(&batch),
        )?;

        Ok(WatchHandle::new(name).on_stop(move || {
            stopping.store(true, Ordering::SeqCst);
            let pid = current.swap(0, Ordering::SeqCst);
            if pid != 0 {
                terminate_group(pid);
            }
            fs.stop();
        }))
    }
}

/// Runs one build per change batch, on the watch thread.
struct Rebuilder {
    name: &'static str,
    command: Vec<String>,
    cwd: PathBuf,
    /// pid of the build in flight, 0 when idle
    current: Arc<AtomicU32>,
    stopping: Arc<AtomicBool>,
    events: mpsc::Sender<PipelineMsg>,
}

impl Rebuilder {
    /// Build and report. `false` once stopping or the pipeline is gone.
    fn on_batch(&mut self, batch: &ChangeBatch) -> bool {
        // A build started now would outlive the stop
        if self.stopping.load(Ordering::SeqCst) {
            return false;
        }
        if !batch.is_empty() {
            crate::debug!(self.name; "{}, rebuilding", batch.summary());
        }

        let outcome = self.build_once();
        if self.stopping.load(Ordering::SeqCst) {
            return false;
        }
        self.events
            .blocking_send(PipelineMsg::Built(outcome))
            .is_ok()
    }

    /// Run the build command to completion and classify the result.
    fn build_once(&self) -> BuildOutcome {
        let spawned = Cmd::from_slice(&self.command)
            .cwd(&self.cwd)
            .own_group()
            .spawn();
        let running = match spawned {
            Ok(running) => running,
            Err(e) => {
                return BuildOutcome::Failed {
                    detail: format!("{e:#}"),
                };
            }
        };

        let pid = running.id();
        self.current.store(pid, Ordering::SeqCst);
        // stop() may have swapped `current` out just before the store
        if self.stopping.load(Ordering::SeqCst) {
            terminate_group(pid);
        }

        let name = running.name().to_string();
        let result = running.wait();
        self.current.store(0, Ordering::SeqCst);

        match result {
            Ok(output) if output.status.success() => BuildOutcome::Succeeded,
            Ok(output) => BuildOutcome::Failed {
                detail: describe_failure(&name, &output),
            },
            Err(e) => BuildOutcome::Failed {
                detail: format!("{e:#}"),
            },
        }
    }
}
