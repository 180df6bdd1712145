//! Build tool adapters.
//!
//! The bundler is an external collaborator. Each adapter runs a target's
//! build command in watch mode and reports every rebuild attempt as a
//! [`BuildOutcome`] on the pipeline's channel.
//!
//! | Strategy   | Who watches sources | Completion signal              |
//! |------------|---------------------|--------------------------------|
//! | `resident` | the build tool      | burst of writes to `out_dir`   |
//! | `oneshot`  | devwatch            | exit status of one command run |

mod oneshot;
mod resident;

pub use oneshot::Oneshot;
pub use resident::Resident;

use std::path::Path;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::actor::messages::PipelineMsg;
use crate::config::{Section, Strategy, TargetConfig};

/// Result of one rebuild attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed { detail: String },
}

/// Build tool contract.
///
/// `watch` must return once the watch is registered, not once a build
/// completes. After that the tool performs an initial build, reports every
/// attempt, and keeps running after failures until stopped.
pub trait BuildTool: Send {
    fn watch(self: Box<Self>, events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle>;
}

/// Stops a running watch-build.
pub struct WatchHandle {
    target: &'static str,
    stoppers: Vec<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            stoppers: Vec::new(),
        }
    }

    /// Register cleanup run by `stop`, in registration order.
    pub fn on_stop(mut self, stopper: impl FnOnce() + Send + 'static) -> Self {
        self.stoppers.push(Box::new(stopper));
        self
    }

    /// Terminate every process and watcher the adapter started.
    pub fn stop(self) {
        crate::debug!(self.target; "stopping watch");
        for stopper in self.stoppers {
            stopper();
        }
    }
}

/// Create the adapter for a target section.
pub fn from_config(section: Section, config: &TargetConfig) -> Box<dyn BuildTool> {
    match config.strategy {
        Strategy::Resident => Box::new(Resident::new(section, config.clone())),
        Strategy::Oneshot => Box::new(Oneshot::new(section, config.clone())),
    }
}

/// Fail early when the build program cannot be found.
fn ensure_program(section: Section, command: &[String], cwd: &Path) -> Result<()> {
    let program = command
        .first()
        .ok_or_else(|| anyhow!("{}.command is empty", section.name()))?;

    let paths = std::env::var_os("PATH");
    which::which_in(program, paths, cwd)
        .map(drop)
        .map_err(|_| anyhow!("[{}] build program `{}` not found", section.name(), program))
}
