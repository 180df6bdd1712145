//! Reload Module
//!
//! Live reload for the renderer: the message protocol spoken over the dev
//! server's WebSocket channel.
//!
//! ```text
//! worker rebuilt / renderer changed -> WsActor -> Browser (location.reload)
//! ```

pub mod message;

pub use message::ReloadMessage;
