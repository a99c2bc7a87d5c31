//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::dispatch::{CacheStore, Context, DispatchTable};
use crate::error::Result;
use crate::protocol::Expression;

use super::connection::TcpConnection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable flag that stops the accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for kvcache
pub struct Server {
    config: Config,
    store: CacheStore,
    table: Arc<DispatchTable>,
    listener: Option<TcpListener>,
    shutdown: ShutdownHandle,

    /// Connections currently being served
    active: Arc<AtomicUsize>,

    /// Id for the next connection thread name
    next_id: u64,
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: CacheStore) -> Self {
        Self {
            config,
            store,
            table: Arc::new(DispatchTable::new()),
            listener: None,
            shutdown: ShutdownHandle::default(),
            active: Arc::new(AtomicUsize::new(0)),
            next_id: 0,
        }
    }

    /// Serve a custom command table instead of the built-in one
    pub fn with_dispatch_table(mut self, table: DispatchTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Bind the listener (idempotent) and return the bound address
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }

        let listener = TcpListener::bind(&self.config.listen_addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);

        tracing::info!("Listening on {}", addr);
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref()?.local_addr().ok()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking)
    ///
    /// Returns after a shutdown signal. The store executor is stopped on the
    /// way out; connection threads still running see `StoreClosed` errors.
    pub fn run(&mut self) -> Result<()> {
        self.bind()?;

        while !self.shutdown.is_shutdown() {
            let accepted = match &self.listener {
                Some(listener) => listener.accept(),
                None => break,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, {} connection(s) still open", self.active_connections());
        self.listener = None;
        self.store.shutdown();
        Ok(())
    }

    fn spawn_connection(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: max connections ({}) reached", peer, self.config.max_connections);
            let reply = Expression::error("ERR max number of clients reached").to_bytes();
            let _ = stream.write_all(&reply);
            return;
        }

        // Accepted sockets may inherit non-blocking mode from the listener
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping {}: {}", peer, e);
            return;
        }

        self.next_id += 1;
        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let table = Arc::clone(&self.table);
        let context = Context::new(self.store.clone());
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("kvcache-conn-{}", self.next_id))
            .spawn(move || {
                let _guard = guard;
                let result = TcpConnection::from_tcp(stream, table, context).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} closed with error: {}", peer, e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn thread for {}: {}", peer, e);
        }
    }
}

/// Counts a connection as active for as long as it lives
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
