//! Store Module
//!
//! In-memory key-value store with per-key and whole-store TTLs.
//!
//! ## Concurrency Model: Single Owner / Command Queue
//!
//! The entry map is owned by one executor thread. Every public operation
//! becomes a [`StoreCommand`] pushed onto one unbounded queue, so the order
//! of effects on the map is exactly the enqueue order.
//!
//! - **Writes** (set/delete/expire): fire-and-forget, never block
//! - **Reads** (get/keys/values/len/ttl): block on a one-shot reply channel
//!
//! ```text
//!  caller ──┐
//!  caller ──┼──► [ command queue ] ──► executor ──► HashMap<K, ValueCell<V>>
//!  caller ──┘                             ▲
//!                           sweep tick ───┘
//! ```
//!
//! Before running any command the executor checks the whole-store TTL and
//! clears the map if it elapsed. A periodic tick runs a full sweep
//! (whole-store check, then per-key eviction) when there is no traffic.
//!
//! Reads filter expired entries lazily, so `get`, `keys`, `values` and
//! `len` agree with each other even before the sweep runs.

mod cell;
mod command;
mod executor;

pub use cell::ValueCell;
pub use command::StoreCommand;

use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::DEFAULT_SWEEP_INTERVAL;
use crate::error::{KvError, Result};
use command::reply_channel;

/// Shortest sweep period the executor will tick at
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

fn clamp_sweep_interval(requested: Duration) -> Duration {
    if requested < MIN_SWEEP_INTERVAL {
        tracing::warn!(
            ?requested,
            "sweep interval below {:?}, using the minimum",
            MIN_SWEEP_INTERVAL
        );
        return MIN_SWEEP_INTERVAL;
    }
    requested
}

/// Handle to a running store
///
/// Cheap to clone; every clone feeds the same executor.
pub struct Store<K, V> {
    commands: Sender<StoreCommand<K, V>>,

    /// Executor thread, taken on shutdown
    executor: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Start a store with the default 10 second sweep period
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// Start a store whose idle sweep runs every `sweep_interval`
    ///
    /// Intervals below [`MIN_SWEEP_INTERVAL`] (including zero) are raised
    /// to it.
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        let sweep_interval = clamp_sweep_interval(sweep_interval);
        let (commands, queue) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("kvcache-store".to_string())
            .spawn(move || executor::run(queue, sweep_interval))
            .map_err(|e| tracing::error!("failed to spawn store executor: {}", e))
            .ok();

        Self {
            commands,
            executor: Arc::new(Mutex::new(handle)),
        }
    }

    // =========================================================================
    // Writes (fire-and-forget)
    // =========================================================================

    /// Insert or update a value
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.send(StoreCommand::Set { key, value })
    }

    /// Remove a key; no-op if absent
    pub fn delete(&self, key: K) -> Result<()> {
        self.send(StoreCommand::Delete { key })
    }

    /// Expire `key` after `ttl` from now; no-op if absent
    pub fn expire_key(&self, key: K, ttl: Duration) -> Result<()> {
        self.send(StoreCommand::ExpireKey { key, ttl })
    }

    /// Clear the whole store after `ttl` from now
    pub fn expire(&self, ttl: Duration) -> Result<()> {
        self.send(StoreCommand::Expire { ttl })
    }

    // =========================================================================
    // Reads (block on reply)
    // =========================================================================

    /// Get a value, `None` if absent or expired
    pub fn get(&self, key: K) -> Result<Option<V>> {
        self.request(|reply| StoreCommand::Get { key, reply })
    }

    pub fn keys(&self) -> Result<Vec<K>> {
        self.request(|reply| StoreCommand::Keys { reply })
    }

    pub fn values(&self) -> Result<Vec<V>> {
        self.request(|reply| StoreCommand::Values { reply })
    }

    /// Number of live entries
    pub fn len(&self) -> Result<usize> {
        self.request(|reply| StoreCommand::Len { reply })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Configured TTL of `key`, zero if absent or without expiry
    pub fn ttl_key(&self, key: K) -> Result<Duration> {
        self.request(|reply| StoreCommand::TtlKey { key, reply })
    }

    /// Configured whole-store TTL, zero if none is pending
    pub fn ttl(&self) -> Result<Duration> {
        self.request(|reply| StoreCommand::Ttl { reply })
    }

    /// Whether the whole-store TTL had elapsed when this request was served
    ///
    /// The executor clears an expired store before serving any command, so a
    /// `true` here means the entries were just dropped.
    pub fn is_expired(&self) -> Result<bool> {
        self.request(|reply| StoreCommand::IsExpired { reply })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stop the executor and its sweep ticker, waiting for it to exit
    ///
    /// Commands queued before the shutdown are still applied. Later calls on
    /// any clone fail with `StoreClosed`.
    pub fn shutdown(&self) {
        let Some(handle) = self.executor.lock().take() else {
            return;
        };
        let _ = self.commands.send(StoreCommand::Shutdown);
        if handle.join().is_err() {
            tracing::error!("store executor panicked");
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn send(&self, command: StoreCommand<K, V>) -> Result<()> {
        self.commands.send(command).map_err(|_| KvError::StoreClosed)
    }

    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> StoreCommand<K, V>) -> Result<T> {
        let (reply, response): (Sender<T>, Receiver<T>) = reply_channel();
        self.send(build(reply))?;
        response.recv().map_err(|_| KvError::StoreClosed)
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
