//! WebSocket Actor - Live Reload Broadcast
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting reload messages to all connected clients
//! - Dropping clients that closed or whose send failed
//!
//! # Architecture
//!
//! ```text
//! acceptor thread --[AddClient]--> WsActor --[broadcast]--> Clients
//! Broadcaster     --[Broadcast]-->    ^
//!                                     |
//!          reader thread (pings, close frames) drops dead clients
//! ```
//!
//! Handshakes happen on the acceptor thread, so the actor never blocks the
//! runtime it shares with the pipelines.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::ReloadMessage;

/// How often the reader thread polls clients for close frames.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

// =============================================================================
// Broadcaster
// =============================================================================

/// Send side of the live reload channel.
///
/// `broadcast` never blocks and never fails from the caller's point of view:
/// delivery is best effort.
#[derive(Clone)]
pub struct Broadcaster {
    tx: mpsc::UnboundedSender<WsMsg>,
}

impl Broadcaster {
    pub fn new(tx: mpsc::UnboundedSender<WsMsg>) -> Self {
        Self { tx }
    }

    /// Queue `msg` for every client connected at delivery time.
    pub fn broadcast(&self, msg: ReloadMessage) {
        if self.tx.send(WsMsg::Broadcast(msg)).is_err() {
            crate::debug!("ws"; "broadcast after shutdown, dropped");
        }
    }
}

// =============================================================================
// WsActor
// =============================================================================

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::UnboundedReceiver<WsMsg>,
    /// Connected clients (shared with the reader thread)
    clients: Clients,
    /// Stops the reader thread
    stopped: Arc<AtomicBool>,
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::UnboundedReceiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let stopped = Arc::clone(&self.stopped);
        std::thread::spawn(move || client_reader_loop(&clients_for_reader, &stopped));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Broadcast(msg) => {
                    self.broadcast(&msg);
                }
                WsMsg::AddClient(ws) => {
                    self.add_client(ws);
                }
                WsMsg::Shutdown => break,
            }
        }

        crate::debug!("ws"; "shutting down");
        self.stopped.store(true, Ordering::SeqCst);
        for mut client in self.clients.lock().drain(..) {
            let _ = client.close(None);
            let _ = client.flush();
        }
    }

    /// Register a client and greet it with `connected`.
    fn add_client(&self, mut ws: WebSocket<TcpStream>) {
        let connected = ReloadMessage::connected();
        if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
            crate::log!("ws"; "failed to send connected message: {}", e);
            return;
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Broadcast a message to all connected clients, returning how many
    /// received it.
    fn broadcast(&self, msg: &ReloadMessage) -> usize {
        let mut clients = self.clients.lock();

        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return 0;
        }

        let frame = Message::Text(msg.to_json().into());
        clients.retain_mut(|client| match client.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", clients.len());
        clients.len()
    }
}

/// Background thread reading client frames (non-blocking poll).
///
/// Clients never send anything meaningful; reading answers pings and
/// notices close frames so dead clients do not pile up between reloads.
fn client_reader_loop(clients: &Clients, stopped: &AtomicBool) {
    while !stopped.load(Ordering::SeqCst) {
        std::thread::sleep(READ_POLL_INTERVAL);

        let mut clients = clients.lock();
        clients.retain_mut(|client| match client.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_with_zero_clients() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let actor = WsActor::new(rx);
        assert_eq!(actor.broadcast(&ReloadMessage::FullReload), 0);
    }

    #[tokio::test]
    async fn test_broadcaster_after_shutdown_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        let broadcaster = Broadcaster::new(tx.clone());

        tx.send(WsMsg::Shutdown).unwrap_or_else(|_| panic!("actor gone"));
        WsActor::new(rx).run().await;

        // Receiver dropped with the actor; must not panic
        broadcaster.broadcast(ReloadMessage::FullReload);
    }

    #[tokio::test]
    async fn test_broadcaster_queues_one_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        Broadcaster::new(tx).broadcast(ReloadMessage::FullReload);

        match rx.recv().await {
            Some(WsMsg::Broadcast(ReloadMessage::FullReload)) => {}
            _ => panic!("expected one full-reload broadcast"),
        }
        assert!(rx.try_recv().is_err());
    }
}
