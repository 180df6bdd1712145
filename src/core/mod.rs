//! Core types shared across the codebase.

mod state;

pub use state::{Phase, PhaseCell, is_shutdown, register_shutdown, setup_shutdown_handler};

#[cfg(test)]
pub use state::{SignalAction, on_signal};
