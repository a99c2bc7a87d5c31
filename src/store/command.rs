//! Store command messages
//!
//! Every store operation is a message on the executor's queue. Read
//! operations carry a single-use reply channel.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

/// A message processed by the store executor
#[derive(Debug)]
pub enum StoreCommand<K, V> {
    /// Upsert a value
    Set { key: K, value: V },

    /// Read a value, `None` if absent or expired
    Get { key: K, reply: Sender<Option<V>> },

    /// Remove a key
    Delete { key: K },

    /// Snapshot of live keys
    Keys { reply: Sender<Vec<K>> },

    /// Snapshot of live values
    Values { reply: Sender<Vec<V>> },

    /// Number of live entries
    Len { reply: Sender<usize> },

    /// Start a per-key countdown
    ExpireKey { key: K, ttl: Duration },

    /// Configured per-key TTL
    TtlKey { key: K, reply: Sender<Duration> },

    /// Start a whole-store countdown
    Expire { ttl: Duration },

    /// Configured whole-store TTL
    Ttl { reply: Sender<Duration> },

    /// Whole-store expiry predicate
    IsExpired { reply: Sender<bool> },

    /// Stop the executor loop
    Shutdown,
}

/// Create a reply channel that holds exactly one message
pub(crate) fn reply_channel<T>() -> (Sender<T>, Receiver<T>) {
    channel::bounded(1)
}
