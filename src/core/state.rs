//! Orchestrator phase tracking and interrupt handling.
//!
//! The orchestrator only moves forward:
//! `NotStarted → ServerStarting → ServerReady → PipelinesStarting → Running`,
//! and enters `Stopping` once an interrupt arrives.
//!
//! `SHUTDOWN` is process-global (set by the signal handler) so that blocking
//! threads such as the HTTP request loop can answer 503 while cleanup runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc::UnboundedSender;

/// Shutdown has been requested (Ctrl+C, SIGTERM or SIGHUP received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for the orchestrator
static SHUTDOWN_TX: OnceLock<UnboundedSender<()>> = OnceLock::new();

// =============================================================================
// Phase
// =============================================================================

/// Orchestrator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    NotStarted = 0,
    ServerStarting = 1,
    ServerReady = 2,
    PipelinesStarting = 3,
    Running = 4,
    Stopping = 5,
}

impl Phase {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::ServerStarting,
            2 => Self::ServerReady,
            3 => Self::PipelinesStarting,
            4 => Self::Running,
            _ => Self::Stopping,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::ServerStarting => "server-starting",
            Self::ServerReady => "server-ready",
            Self::PipelinesStarting => "pipelines-starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared, forward-only phase cell.
///
/// Cloning shares the underlying state, so observers (tests, the HTTP
/// thread) see transitions made by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct PhaseCell(Arc<AtomicU8>);

impl PhaseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Advance to `next`. Returns `false` (and leaves the phase unchanged)
    /// when `next` is not later than the current phase.
    pub fn advance(&self, next: Phase) -> bool {
        let next = next as u8;
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (next > current).then_some(next)
            })
            .is_ok()
    }
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// What to do about one interrupt or termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// The orchestrator was told to tear down
    Notified,
    /// Nothing to clean up, or cleanup already running
    Exit(i32),
}

/// Record a signal in `flag` and forward it to the orchestrator.
pub fn on_signal(flag: &AtomicBool, tx: Option<&UnboundedSender<()>>) -> SignalAction {
    if flag.swap(true, Ordering::SeqCst) {
        return SignalAction::Exit(130);
    }

    match tx {
        Some(tx) if tx.send(()).is_ok() => SignalAction::Notified,
        _ => SignalAction::Exit(0),
    }
}

/// Setup the global signal handler. Call once at program start.
///
/// Ctrl+C, SIGTERM and SIGHUP are handled alike. Host and build processes
/// run in their own process groups and never see these signals, so they
/// are only cleaned up through this path.
///
/// - Before `register_shutdown()`: exit immediately, nothing to clean up
/// - After `register_shutdown()`: notify the orchestrator, which terminates
///   the host process and watch processes
/// - Second signal while cleanup runs: exit immediately
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| match on_signal(&SHUTDOWN, SHUTDOWN_TX.get()) {
        SignalAction::Notified => crate::log!("serve"; "shutting down..."),
        SignalAction::Exit(code) => std::process::exit(code),
    })
    .map_err(|e| anyhow::anyhow!("failed to set signal handler: {}", e))
}

/// Register the orchestrator's shutdown channel.
///
/// Call before the orchestrator starts anything it would need to clean up.
pub fn register_shutdown(tx: UnboundedSender<()>) {
    let _ = SHUTDOWN_TX.set(tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================
