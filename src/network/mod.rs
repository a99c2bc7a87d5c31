//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop (non-blocking, polls a shutdown flag)
//! - One thread per connection
//! - Commands routed through the dispatch table to the store

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{Connection, TcpConnection};
