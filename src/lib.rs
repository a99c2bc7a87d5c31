//! # kvcache
//!
//! An in-memory key-value cache with:
//! - Per-key TTLs and a one-shot whole-store TTL
//! - A single-owner store driven by a command queue (no locks on the map)
//! - A RESP-style text protocol over TCP, one thread per client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  CommandFrame
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Dispatch Table                             │
//! │                 (verb → handler)                             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  StoreCommand
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Store Executor                               │
//! │      (single owner of the map, periodic sweep)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod protocol;
pub mod dispatch;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use store::Store;
pub use protocol::{CommandFrame, Expression};
pub use dispatch::DispatchTable;
pub use network::Server;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
