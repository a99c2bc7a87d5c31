//! Connection Handler
//!
//! Runs the read → dispatch → write loop for one client.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::{Context, DispatchTable};
use crate::error::{KvError, Result};
use crate::protocol::{write_expression, CommandFrame, Expression};

/// A connection over a TCP socket
pub type TcpConnection = Connection<TcpStream, TcpStream>;

/// Handles a single client connection
pub struct Connection<R, W: Write> {
    /// Stream reader (buffered for efficiency)
    reader: BufReader<R>,

    /// Stream writer (buffered for efficiency)
    writer: BufWriter<W>,

    /// Verb → handler table, shared by all connections
    table: Arc<DispatchTable>,

    /// Handler context (store handle)
    context: Context,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpConnection {
    /// Wrap an accepted socket
    pub fn from_tcp(stream: TcpStream, table: Arc<DispatchTable>, context: Context) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self::new(read_stream, stream, table, context, peer_addr))
    }

    /// Configure connection timeouts (0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }
}

impl<R: Read, W: Write> Connection<R, W> {
    pub fn new(
        reader: R,
        writer: W,
        table: Arc<DispatchTable>,
        context: Context,
        peer_addr: impl Into<String>,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            table,
            context,
            peer_addr: peer_addr.into(),
        }
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns `Ok` when the client disconnects. Protocol errors are answered
    /// and the loop goes on, unless the framing can no longer be trusted.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let frame = match CommandFrame::read_from(&mut self.reader) {
                Ok(frame) => frame,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Protocol error from {}: {}", self.peer_addr, e);
                    self.discard_buffered();
                    if !self.reply(&Expression::error(format!("ERR {}", e)))? {
                        return Ok(());
                    }
                    continue;
                }
                Err(e @ KvError::Desync(_)) => {
                    tracing::warn!("Closing {} after unrecoverable input: {}", self.peer_addr, e);
                    let _ = self.send(&Expression::error(format!("ERR {}", e)));
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received frame from {}: {:?}", self.peer_addr, frame);

            if frame.is_carriage_return() {
                continue;
            }

            let response = self.table.dispatch(&self.context, &frame);
            if !self.reply(&response)? {
                return Ok(());
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Everything written so far (flushed after every reply)
    pub fn get_writer(&self) -> &W {
        self.writer.get_ref()
    }

    /// Send a reply; `Ok(false)` means the client is gone
    fn reply(&mut self, response: &Expression) -> Result<bool> {
        match self.send(response) {
            Ok(()) => Ok(true),
            Err(e) if e.is_disconnect() => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    fn send(&mut self, response: &Expression) -> Result<()> {
        write_expression(&mut self.writer, response)
    }

    /// Drop input already received, to resync on the client's next request
    fn discard_buffered(&mut self) {
        let pending = self.reader.buffer().len();
        self.reader.consume(pending);
    }
}
