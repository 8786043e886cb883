//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{HashLogError, Result};
use crate::protocol::{read_command, write_response, Command, Response};
use crate::registry::Registry;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Databases the commands run against
    registry: Arc<Registry>,

    /// Peer address for logging
    peer_addr: String,

    /// Commands answered on this connection
    served: u64,

    /// Log writes (set/delete/compact) among them
    writes: u64,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, registry: Arc<Registry>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            registry,
            peer_addr,
            served: 0,
            writes: 0,
        })
    }

    /// Configure connection timeouts (0 leaves a direction without timeout)
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

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(HashLogError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        served = self.served,
                        writes = self.writes,
                        reason = ?e.kind(),
                        "client disconnected"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            if command.is_write() {
                self.writes += 1;
            }
            let response = self.execute_command(command);
            self.served += 1;

            if let Err(e) = self.send_response(response) {
                if let HashLogError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command against the registry and map the outcome
    ///
    /// Misses and rejected arguments are ordinary answers; anything else is
    /// an I/O fault on the database and is logged as such.
    fn execute_command(&self, command: Command) -> Response {
        let kind = command.command_type();
        let result = self.registry.execute(command);
        if let Err(ref e) = result {
            if e.is_recoverable() {
                tracing::debug!(peer = %self.peer_addr, command = ?kind, "rejected: {}", e);
            } else {
                tracing::error!(peer = %self.peer_addr, command = ?kind, "command failed: {}", e);
            }
        }
        Response::from_result(result)
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Read errors that mean the peer went away or idled out
/// (Windows reports read timeouts as TimedOut instead of WouldBlock)
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
