//! Value cell
//!
//! A stored value plus its own expiry bookkeeping.

use std::time::{Duration, Instant};

/// A single value with an optional per-key TTL
///
/// The cell is expired when `ttl > 0` and more than `ttl` has passed since
/// `last_access`. A zero TTL never expires.
#[derive(Debug, Clone)]
pub struct ValueCell<V> {
    value: V,
    ttl: Duration,
    last_access: Instant,
}

impl<V> ValueCell<V> {
    /// Create a cell with no expiry
    pub fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            ttl: Duration::ZERO,
            last_access: now,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// The configured TTL (not the remaining time)
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Replace the value and refresh `last_access`
    ///
    /// If the cell had already expired, its TTL is dropped: the update
    /// resurrects the key without any pending expiry.
    pub fn set_value(&mut self, value: V, now: Instant) {
        if self.is_expired(now) {
            self.ttl = Duration::ZERO;
        }
        self.value = value;
        self.last_access = now;
    }

    /// Start a countdown of `ttl` from `now`. A zero TTL clears the expiry.
    pub fn expire(&mut self, ttl: Duration, now: Instant) {
        self.ttl = ttl;
        self.last_access = now;
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.ttl.is_zero() && now.saturating_duration_since(self.last_access) > self.ttl
    }
}
