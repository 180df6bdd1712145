//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! BuildTool --Built--> PipelineActor --Broadcast--> WsActor --> Clients
//!                           |
//!                           +--> respawn host process
//! ```

use std::net::TcpStream;

use tungstenite::WebSocket;

use crate::build::BuildOutcome;
use crate::reload::ReloadMessage;

// =============================================================================
// PipelineActor Messages
// =============================================================================

/// Messages to a Pipeline Actor
#[derive(Debug)]
pub enum PipelineMsg {
    /// A rebuild attempt finished
    Built(BuildOutcome),
    /// Stop consuming; terminate whatever the handler owns
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Push a message to every connected client
    Broadcast(ReloadMessage),
    /// Add a client whose handshake already completed
    AddClient(WebSocket<TcpStream>),
    /// Close all clients and stop
    Shutdown,
}
