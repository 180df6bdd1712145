//! Worker pipeline: reload every connected renderer after each rebuild.

use anyhow::Result;

use super::RebuildHandler;
use crate::actor::ws::Broadcaster;
use crate::logger::status_success;
use crate::reload::ReloadMessage;

pub struct Reload {
    target: &'static str,
    broadcaster: Broadcaster,
}

impl Reload {
    pub fn new(target: &'static str, broadcaster: Broadcaster) -> Self {
        Self {
            target,
            broadcaster,
        }
    }
}

impl RebuildHandler for Reload {
    fn on_rebuilt(&mut self) -> Result<()> {
        self.broadcaster.broadcast(ReloadMessage::FullReload);
        status_success(self.target, "rebuilt, reloading renderer");
        Ok(())
    }
}
