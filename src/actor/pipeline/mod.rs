//! Watch Pipelines
//!
//! A pipeline owns one persistent watch-build and reacts to its outcomes:
//!
//! ```text
//! BuildTool --Built(outcome)--> PipelineActor --on_rebuilt--> handler
//!   (threads)      mpsc              (task)
//! ```
//!
//! Outcomes are consumed one at a time, so the handler for rebuild N
//! finishes before rebuild N+1 is looked at. Failed builds are reported
//! and never reach the handler.
//!
//! | Handler   | Target   | On success                         |
//! |-----------|----------|------------------------------------|
//! | `Reload`  | worker   | broadcast `full-reload`            |
//! | `Respawn` | main     | terminate host process, spawn anew |

mod main;
mod worker;


pub use main::Respawn;
pub use worker::Reload;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::PipelineMsg;
use crate::build::{BuildOutcome, BuildTool, WatchHandle};
use crate::config::Section;
use crate::logger::status_error;

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

/// Reaction to a successful rebuild.
pub trait RebuildHandler: Send + 'static {
    /// Called once per successful rebuild, including the first.
    /// Errors are reported and do not stop the pipeline.
    fn on_rebuilt(&mut self) -> Result<()>;

    /// Release whatever the handler owns.
    fn shutdown(&mut self) {}
}

impl<F> RebuildHandler for F
where
    F: FnMut() -> Result<()> + Send + 'static,
{
    fn on_rebuilt(&mut self) -> Result<()> {
        self()
    }
}

// =============================================================================
// PipelineActor
// =============================================================================

/// Consumes build outcomes for one target.
pub struct PipelineActor<H> {
    target: &'static str,
    rx: mpsc::Receiver<PipelineMsg>,
    handler: H,
}

impl<H: RebuildHandler> PipelineActor<H> {
    pub fn new(target: &'static str, rx: mpsc::Receiver<PipelineMsg>, handler: H) -> Self {
        Self {
            target,
            rx,
            handler,
        }
    }

    /// Run until `Shutdown` (or every sender is gone), then hand the
    /// handler back after shutting it down.
    pub async fn run(mut self) -> H {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                PipelineMsg::Built(BuildOutcome::Succeeded) => {
                    crate::debug!(self.target; "build succeeded");
                    if let Err(e) = self.handler.on_rebuilt() {
                        status_error(self.target, "after-build step failed", &format!("{e:#}"));
                    }
                }
                PipelineMsg::Built(BuildOutcome::Failed { detail }) => {
                    status_error(self.target, "build failed", &detail);
                }
                PipelineMsg::Shutdown => break,
            }
        }

        crate::debug!(self.target; "pipeline stopped");
        self.handler.shutdown();
        self.handler
    }
}

// =============================================================================
// WatchPipeline
// =============================================================================

/// A running pipeline: the actor task plus the build tool feeding it.
pub struct WatchPipeline<H> {
    target: &'static str,
    tx: mpsc::Sender<PipelineMsg>,
    task: JoinHandle<H>,
    watch: WatchHandle,
}

impl<H: RebuildHandler> WatchPipeline<H> {
    /// Start the actor, then the build tool.
    ///
    /// Returns once the watch is registered; the initial build completes
    /// later and arrives like any other rebuild.
    pub fn start(section: Section, tool: Box<dyn BuildTool>, handler: H) -> Result<Self> {
        let target = section.name();
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let task = tokio::spawn(PipelineActor::new(target, rx, handler).run());

        let watch = match tool.watch(tx.clone()) {
            Ok(watch) => watch,
            Err(e) => {
                task.abort();
                return Err(e);
            }
        };

        crate::debug!(target; "watch registered");
        Ok(Self {
            target,
            tx,
            task,
            watch,
        })
    }

    /// Stop consuming, release the handler's resources, then stop the
    /// build tool.
    ///
    /// The handler is returned for inspection.
    pub async fn stop(self) -> Option<H> {
        // Outcomes queued before this point are still handled
        let _ = self.tx.send(PipelineMsg::Shutdown).await;
        let handler = self.task.await.ok();
        let target = self.target;
        tokio::task::spawn_blocking(move || self.watch.stop())
            .await
            .ok();
        crate::debug!(target; "stopped");
        handler
    }
}
