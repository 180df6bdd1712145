//! Actor System for the dev session
//!
//! Message-passing concurrency between blocking watchers and async
//! reactions:
//!
//! ```text
//! BuildTool --> PipelineActor --> WsActor     (worker: broadcast)
//! (threads)        (task)     \-> host process (main: respawn)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `pipeline` - Per-target rebuild reactions
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod pipeline;
pub mod ws;

pub use coordinator::Coordinator;
