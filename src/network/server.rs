//! TCP Server
//!
//! Accepts connections and spawns a session thread per client.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::config::Config;
use crate::error::{IndexerError, Result};
use crate::index::IndexStore;

use super::Connection;

/// TCP server for the package index
///
/// ## Architecture
/// - Acceptor thread polls a non-blocking listener so the shutdown flag
///   is observed promptly
/// - Each accepted connection runs in its own named session thread
/// - Shared IndexStore reference for all sessions
///
/// ## Lifecycle
/// ```text
///             bind OK
///   NEW ─────────────────▶ LISTENING
///                            │  shutdown signal
///                            ▼
///                         DRAINING ──(sessions done or grace elapsed)──▶ STOPPED
/// ```
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared package index
    store: Arc<IndexStore>,

    /// TCP listener (present between bind and STOPPED)
    listener: Option<TcpListener>,

    /// Shutdown flag
    shutdown: Arc<AtomicBool>,

    /// Active connection count
    active_connections: Arc<AtomicUsize>,

    /// Sequence number for session thread names
    next_session_id: u64,
}

/// Cloneable handle that signals the server to shut down
///
/// Usable from signal handlers and other threads while the server
/// blocks in `run`.
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shut down gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: Arc<IndexStore>) -> Self {
        Self {
            config,
            store,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            next_session_id: 0,
        }
    }

    /// Bind the configured listen address
    ///
    /// Transitions the server from NEW to LISTENING and returns the
    /// bound address (useful with an ephemeral port). Called implicitly
    /// by `run` if skipped.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            IndexerError::Network(format!(
                "Failed to bind to {}: {}",
                self.config.listen_addr, e
            ))
        })?;

        // Set non-blocking so the accept loop can check the shutdown flag
        listener.set_nonblocking(true)?;

        let addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", addr);
        self.listener = Some(listener);

        Ok(addr)
    }

    /// Serve until shutdown is signaled (blocking)
    ///
    /// This method:
    /// 1. Binds to the configured address (if `bind` wasn't called)
    /// 2. Accepts connections and spawns a session thread for each
    /// 3. On shutdown, stops accepting and drains live sessions within
    ///    the configured grace period
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }

        // Sessions hold a sender clone and report their exit on it, so
        // the drain phase can wait with a deadline
        let (done_tx, done_rx) = unbounded::<()>();

        self.accept_loop(&done_tx);

        drop(done_tx);
        self.drain(done_rx);

        self.listener = None;
        tracing::info!("Server stopped");

        Ok(())
    }

    /// Main accept loop; returns when shutdown is signaled
    fn accept_loop(&mut self, done_tx: &Sender<()>) {
        while !self.shutdown.load(Ordering::Relaxed) {
            // Listener is always present here; run() binds before looping
            let accepted = match &self.listener {
                Some(listener) => listener.accept(),
                None => return,
            };

            match accepted {
                Ok((stream, addr)) => {
                    // Check connection limit
                    let current = self.active_connections.load(Ordering::Relaxed);
                    if current >= self.config.max_connections {
                        tracing::warn!(
                            "Connection limit reached ({}/{}), rejecting {}",
                            current,
                            self.config.max_connections,
                            addr
                        );
                        // Drop the connection
                        drop(stream);
                        continue;
                    }

                    tracing::debug!("Accepted connection from {}", addr);

                    if let Err(e) = self.spawn_session(stream, done_tx.clone()) {
                        tracing::error!("Failed to spawn session for {}: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No pending connections, sleep briefly
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        tracing::error!("Accept error: {}", e);
                    }
                }
            }
        }
    }

    /// Spawn a session thread for an accepted connection
    fn spawn_session(&mut self, stream: std::net::TcpStream, done_tx: Sender<()>) -> Result<()> {
        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown);
        let active = Arc::clone(&self.active_connections);
        let max_line_len = self.config.max_line_len;
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        self.next_session_id += 1;
        let name = format!("pkgindex-conn-{}", self.next_session_id);

        active.fetch_add(1, Ordering::Relaxed);

        let spawned = thread::Builder::new().name(name).spawn(move || {
            match Connection::new(stream, store, shutdown, max_line_len, poll_interval) {
                Ok(mut conn) => {
                    if let Err(e) = conn.handle() {
                        tracing::debug!("Connection {} ended with error: {}", conn.peer_addr(), e);
                    }
                }
                Err(e) => {
                    tracing::debug!("Failed to set up connection: {}", e);
                }
            }

            active.fetch_sub(1, Ordering::Relaxed);
            let _ = done_tx.send(());
        });

        if let Err(e) = spawned {
            // Thread never started, so it will not decrement the counter
            self.active_connections.fetch_sub(1, Ordering::Relaxed);
            return Err(IndexerError::Network(format!(
                "Failed to spawn session thread: {}",
                e
            )));
        }

        Ok(())
    }

    /// Wait for live sessions to finish, bounded by the grace period
    fn drain(&self, done_rx: Receiver<()>) {
        let live = self.active_connections.load(Ordering::Relaxed);
        if live == 0 {
            return;
        }

        tracing::info!("Draining {} live connection(s)...", live);
        let deadline = Instant::now() + Duration::from_millis(self.config.shutdown_grace_ms);

        while self.active_connections.load(Ordering::Relaxed) > 0 {
            match done_rx.recv_deadline(deadline) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        "Grace period elapsed with {} connection(s) still live",
                        self.active_connections.load(Ordering::Relaxed)
                    );
                    return;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        tracing::info!("Shutdown signal received");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// A cloneable handle that triggers shutdown from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Check if the server is running
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed)
    }

    /// Get the number of active connections
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the bound address (if bound)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_ephemeral_port() {
        let config = Config::builder().listen_addr("127.0.0.1:0").build();
        let mut server = Server::new(config, Arc::new(IndexStore::new()));

        let addr = server.bind().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.local_addr(), Some(addr));
        assert!(server.is_running());

        server.shutdown();
        assert!(!server.is_running());
    }

    #[test]
    fn test_bind_failure_is_error() {
        let config = Config::builder().listen_addr("127.0.0.1:0").build();
        let mut first = Server::new(config, Arc::new(IndexStore::new()));
        let addr = first.bind().unwrap();

        // Same port again must fail
        let config = Config::builder().listen_addr(addr.to_string()).build();
        let mut second = Server::new(config, Arc::new(IndexStore::new()));
        assert!(second.bind().is_err());
    }
}
