//! Development server with live reload support.
//!
//! Serves the renderer root over HTTP and pushes reload messages to every
//! open page over a WebSocket on a second port.
//!
//! ```text
//! http thread ── rayon pool ── handle_request ── files from serve.root
//! ws accept thread ── handshake ──[AddClient]──> WsActor (task)
//! ServerHandle::broadcast ─────────[Broadcast]──> WsActor ──> clients
//! ```
//!
//! Both listeners are bound before [`DevServer::start`] returns, so a
//! [`ServerHandle`] always carries a real address.

mod path;
mod response;


use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Request, Server};
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;
use crate::actor::ws::{Broadcaster, WsActor};
use crate::config::ServeConfig;
use crate::embed::serve::RELOAD_JS_PATH;
use crate::{debug, log};

/// Worker threads answering HTTP requests.
const HTTP_THREADS: usize = 4;

/// How often the WebSocket acceptor checks for new connections and stop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A client that connects but never completes its handshake is dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// What request handlers need to know.
struct Site {
    root: PathBuf,
    ws_port: u16,
}

pub struct DevServer;

impl DevServer {
    /// Bind both listeners and start serving.
    ///
    /// One attempt per port: a port that is taken fails the start. Must be
    /// called from within a tokio runtime (the broadcast actor is a task).
    pub fn start(config: &ServeConfig) -> Result<ServerHandle> {
        let addr = SocketAddr::new(config.interface, config.port);
        let server = Server::http(addr)
            .map_err(|e| anyhow!("failed to bind dev server on {addr}: {e}"))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("dev server is not listening on an IP address"))?;
        let server = Arc::new(server);

        let ws_listener = TcpListener::bind((config.interface, config.ws_port))
            .with_context(|| {
                format!(
                    "failed to bind live reload socket on {}:{}",
                    config.interface, config.ws_port
                )
            })?;
        ws_listener.set_nonblocking(true)?;
        let ws_addr = ws_listener.local_addr()?;

        let (ws_tx, ws_rx) = mpsc::unbounded_channel();
        let ws_task = tokio::spawn(WsActor::new(ws_rx).run());
        let stop = Arc::new(AtomicBool::new(false));

        let site = Arc::new(Site {
            root: config.root.clone(),
            ws_port: ws_addr.port(),
        });

        let spawned = spawn_threads(
            Arc::clone(&server),
            site,
            ws_listener,
            ws_tx.clone(),
            Arc::clone(&stop),
        );
        let threads = match spawned {
            Ok(threads) => threads,
            Err(e) => {
                stop.store(true, Ordering::SeqCst);
                server.unblock();
                ws_task.abort();
                return Err(e);
            }
        };

        debug!("ws"; "ws://{}", ws_addr);
        Ok(ServerHandle {
            addr,
            ws_addr,
            server,
            broadcaster: Broadcaster::new(ws_tx.clone()),
            ws_tx,
            ws_task,
            stop,
            threads,
        })
    }
}

fn spawn_threads(
    server: Arc<Server>,
    site: Arc<Site>,
    ws_listener: TcpListener,
    ws_tx: mpsc::UnboundedSender<WsMsg>,
    stop: Arc<AtomicBool>,
) -> Result<Vec<JoinHandle<()>>> {
    // Use thread pool to handle requests concurrently
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(HTTP_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("failed to create http thread pool")?;

    let http = std::thread::Builder::new()
        .name("http".into())
        .spawn(move || run_request_loop(&server, &pool, &site))
        .context("failed to spawn http thread")?;

    let ws = std::thread::Builder::new()
        .name("ws-accept".into())
        .spawn(move || accept_loop(&ws_listener, &ws_tx, &stop))
        .context("failed to spawn ws accept thread")?;

    Ok(vec![http, ws])
}

// ============================================================================
// ServerHandle
// ============================================================================

/// The running dev server.
pub struct ServerHandle {
    addr: SocketAddr,
    ws_addr: SocketAddr,
    server: Arc<Server>,
    broadcaster: Broadcaster,
    ws_tx: mpsc::UnboundedSender<WsMsg>,
    ws_task: tokio::task::JoinHandle<()>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Bound HTTP address.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Bound live reload address.
    pub fn ws_address(&self) -> SocketAddr {
        self.ws_addr
    }

    /// Push `msg` to every connected client. Never blocks; zero clients is
    /// fine. Pipelines hold a [`Broadcaster`] instead.
    #[cfg(test)]
    pub fn broadcast(&self, msg: crate::reload::ReloadMessage) {
        self.broadcaster.broadcast(msg);
    }

    /// Cloneable broadcast capability for pipelines.
    pub fn broadcaster(&self) -> Broadcaster {
        self.broadcaster.clone()
    }

    /// Stop accepting, close clients and wait for the server threads.
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.server.unblock();
        let _ = self.ws_tx.send(WsMsg::Shutdown);
        let _ = self.ws_task.await;

        let threads = self.threads;
        let _ = tokio::task::spawn_blocking(move || {
            for thread in threads {
                let _ = thread.join();
            }
        })
        .await;
        debug!("serve"; "stopped");
    }
}

// ============================================================================
// HTTP
// ============================================================================

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, site: &Arc<Site>) {
    for request in server.incoming_requests() {
        let site = Arc::clone(site);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &site) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, site: &Site) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    // Served from memory, whatever is on disk
    if request.url() == RELOAD_JS_PATH {
        return response::respond_reload_js(request, site.ws_port);
    }

    if let Some(path) = path::resolve_path(request.url(), &site.root) {
        return response::respond_file(request, &path);
    }

    debug!("serve"; "404 {}", request.url());
    response::respond_not_found(request)
}

// ============================================================================
// WebSocket accept
// ============================================================================

/// Accept live reload clients until `stop` is set.
///
/// Handshakes block, so they run here rather than in the actor; finished
/// sockets are switched to non-blocking for the actor's reader.
fn accept_loop(listener: &TcpListener, ws_tx: &mpsc::UnboundedSender<WsMsg>, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => match handshake(stream) {
                Ok(ws) => {
                    debug!("ws"; "client {} connected", peer);
                    if ws_tx.send(WsMsg::AddClient(ws)).is_err() {
                        break;
                    }
                }
                Err(e) => debug!("ws"; "handshake with {} failed: {:#}", peer, e),
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                debug!("ws"; "accept failed: {}", e);
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

fn handshake(stream: TcpStream) -> Result<tungstenite::WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    let ws = tungstenite::accept(stream).map_err(|e| anyhow!("{e}"))?;

    ws.get_ref().set_read_timeout(None)?;
    ws.get_ref().set_nonblocking(true)?;
    Ok(ws)
}
