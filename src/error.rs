//! Error types for kvcache
//!
//! Provides a unified error type for all operations.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for kvcache operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed input the reader can skip past
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Framing can no longer be trusted; the connection must be closed
    #[error("Protocol desync: {0}")]
    Desync(String),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: String },

    #[error("{0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store executor is not running")]
    StoreClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// True when the peer went away: EOF mid-read, reset, abort or broken pipe.
    pub fn is_disconnect(&self) -> bool {
        match self {
            KvError::Io(e) => matches!(
                e.kind(),
                ErrorKind::UnexpectedEof
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True when the error is answered with an error reply and the session goes on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KvError::Protocol(_)
                | KvError::WrongArity { .. }
                | KvError::InvalidArgument(_)
                | KvError::StoreClosed
        )
    }
}
