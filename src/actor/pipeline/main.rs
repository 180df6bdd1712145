//! Main pipeline: relaunch the host process after each rebuild.
//!
//! The previous process is asked to exit first, without waiting for it, so
//! two instances may briefly overlap. In debug mode nothing is launched and
//! the rebuild is only reported.

use anyhow::Result;

use super::RebuildHandler;
use crate::logger::status_success;
use crate::process::{ChildSlot, HostProcess, LaunchSpec, Spawner};

pub struct Respawn<S> {
    target: &'static str,
    spawner: S,
    launch: LaunchSpec,
    debug: bool,
    slot: ChildSlot<Box<dyn HostProcess>>,
}

impl<S: Spawner + 'static> Respawn<S> {
    pub fn new(target: &'static str, spawner: S, launch: LaunchSpec, debug: bool) -> Self {
        Self {
            target,
            spawner,
            launch,
            debug,
            slot: ChildSlot::new(),
        }
    }

    /// The host process currently running, if any.
    #[cfg(test)]
    pub fn current(&self) -> Option<&dyn HostProcess> {
        self.slot.current().map(|child| &**child)
    }

    #[cfg(test)]
    pub fn spawner(&self) -> &S {
        &self.spawner
    }
}

impl<S: Spawner + 'static> RebuildHandler for Respawn<S> {
    fn on_rebuilt(&mut self) -> Result<()> {
        if self.debug {
            status_success(self.target, "rebuilt (debug: launch the host yourself)");
            return Ok(());
        }

        if let Some(previous) = self.slot.take() {
            crate::debug!("host"; "terminating pid {}", previous.id());
            previous.terminate();
        }

        // On failure the slot stays empty; the next rebuild tries again
        let child = self.spawner.spawn(&self.launch)?;
        for (key, value) in child.env() {
            crate::debug!("host"; "{}={}", key, value);
        }
        status_success(
            self.target,
            &format!("rebuilt, {} started (pid {})", self.launch.program, child.id()),
        );
        self.slot.replace(child);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(child) = self.slot.take() {
            crate::debug!("host"; "terminating pid {}", child.id());
            child.terminate();
        }
    }
}
