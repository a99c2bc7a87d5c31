//! Store executor
//!
//! The only code that touches the entry map. One thread drains the command
//! queue in order and, on a fixed tick, sweeps expired entries.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, select, Receiver};

use super::cell::ValueCell;
use super::command::StoreCommand;

/// Mutable store state, owned by the executor thread
#[derive(Debug)]
pub(crate) struct StoreState<K, V> {
    entries: HashMap<K, ValueCell<V>>,

    /// Whole-store TTL (0 = none)
    ttl: Duration,

    /// Start of the whole-store countdown
    last_access: Instant,
}

impl<K, V> StoreState<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::ZERO,
            last_access: now,
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        !self.ttl.is_zero() && now.saturating_duration_since(self.last_access) > self.ttl
    }

    /// Drop every entry if the whole-store TTL has run out
    ///
    /// The store TTL is one-shot: it resets to zero once it fires.
    pub(crate) fn clear_if_expired(&mut self, now: Instant) -> bool {
        if !self.is_expired(now) {
            return false;
        }
        let dropped = self.entries.len();
        self.entries.clear();
        self.ttl = Duration::ZERO;
        self.last_access = now;
        tracing::debug!(dropped, "whole-store ttl elapsed, store cleared");
        true
    }

    /// Full sweep: whole-store check, then per-key eviction
    ///
    /// Returns the number of entries removed.
    pub(crate) fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        if self.clear_if_expired(now) {
            return before;
        }

        self.entries.retain(|_, cell| !cell.is_expired(now));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "swept expired keys");
        }
        evicted
    }

    /// Apply one command
    ///
    /// The whole-store check runs first, so `IsExpired` reports what that
    /// check saw.
    pub(crate) fn execute(&mut self, command: StoreCommand<K, V>, now: Instant) {
        let store_expired = self.clear_if_expired(now);

        match command {
            StoreCommand::Set { key, value } => match self.entries.get_mut(&key) {
                Some(cell) => cell.set_value(value, now),
                None => {
                    self.entries.insert(key, ValueCell::new(value, now));
                }
            },
            StoreCommand::Get { key, reply } => {
                let value = self
                    .entries
                    .get(&key)
                    .filter(|cell| !cell.is_expired(now))
                    .map(|cell| cell.value().clone());
                let _ = reply.send(value);
            }
            StoreCommand::Delete { key } => {
                self.entries.remove(&key);
            }
            StoreCommand::Keys { reply } => {
                let keys = self
                    .live(now)
                    .map(|(key, _)| key.clone())
                    .collect();
                let _ = reply.send(keys);
            }
            StoreCommand::Values { reply } => {
                let values = self
                    .live(now)
                    .map(|(_, cell)| cell.value().clone())
                    .collect();
                let _ = reply.send(values);
            }
            StoreCommand::Len { reply } => {
                let _ = reply.send(self.live(now).count());
            }
            StoreCommand::ExpireKey { key, ttl } => {
                if let Some(cell) = self
                    .entries
                    .get_mut(&key)
                    .filter(|cell| !cell.is_expired(now))
                {
                    cell.expire(ttl, now);
                }
            }
            StoreCommand::TtlKey { key, reply } => {
                let ttl = self
                    .entries
                    .get(&key)
                    .filter(|cell| !cell.is_expired(now))
                    .map(|cell| cell.ttl())
                    .unwrap_or(Duration::ZERO);
                let _ = reply.send(ttl);
            }
            StoreCommand::Expire { ttl } => {
                self.ttl = ttl;
                self.last_access = now;
            }
            StoreCommand::Ttl { reply } => {
                let _ = reply.send(self.ttl);
            }
            StoreCommand::IsExpired { reply } => {
                let _ = reply.send(store_expired);
            }
            // Handled by the run loop
            StoreCommand::Shutdown => {}
        }
    }

    /// Raw entry count, including expired entries not yet swept
    pub(crate) fn stored_len(&self) -> usize {
        self.entries.len()
    }

    fn live(&self, now: Instant) -> impl Iterator<Item = (&K, &ValueCell<V>)> {
        self.entries
            .iter()
            .filter(move |(_, cell)| !cell.is_expired(now))
    }
}

/// Executor loop
///
/// Runs until a `Shutdown` message arrives or every sender is dropped. The
/// ticker is owned by this loop and stops with it.
pub(crate) fn run<K, V>(commands: Receiver<StoreCommand<K, V>>, sweep_interval: Duration)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let mut state = StoreState::new(Instant::now());
    let ticker = channel::tick(sweep_interval);

    tracing::debug!(?sweep_interval, "store executor started");

    loop {
        select! {
            recv(commands) -> message => match message {
                Ok(StoreCommand::Shutdown) | Err(_) => break,
                Ok(command) => state.execute(command, Instant::now()),
            },
            recv(ticker) -> _ => {
                state.sweep(Instant::now());
            }
        }
    }

    tracing::debug!(entries = state.stored_len(), "store executor stopped");
}
