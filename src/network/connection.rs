//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::{KvError, Result};
use crate::protocol::{encode_value, read_value, Value};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared command dispatcher
    dispatcher: Arc<Dispatcher>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on two handles to the same socket
    pub fn new(stream: TcpStream, dispatcher: Arc<Dispatcher>) -> Result<Self> {
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
            dispatcher,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the timeout disabled)
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
    /// Returns `Ok` when the client disconnects, including abrupt resets.
    /// Returns the error on a protocol fault or any other I/O failure; in
    /// that case nothing further is written and the socket is closed when
    /// the connection is dropped.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        match serve(&mut self.reader, &mut self.writer, &self.dispatcher) {
            Ok(()) => {
                tracing::debug!("Client {} disconnected", self.peer_addr);
                Ok(())
            }
            Err(KvError::Io(ref e)) if is_peer_gone(e.kind()) => {
                tracing::debug!("Connection to {} dropped: {}", self.peer_addr, e);
                Ok(())
            }
            Err(KvError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                // Read timeout (Windows uses TimedOut instead of WouldBlock)
                tracing::debug!("Timeout for client {}", self.peer_addr);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Closing connection to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Run the request/response loop over any byte stream
///
/// Reads one request, executes it, writes the reply, and repeats until the
/// peer closes the stream at a request boundary (`Ok`) or a protocol or I/O
/// fault occurs (`Err`). Command failures are answered with an error value
/// and do not end the loop.
pub fn serve<R, W>(reader: &mut R, writer: &mut W, dispatcher: &Dispatcher) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        let request = match read_value(reader) {
            Ok(value) => value,
            Err(KvError::Disconnect) => return Ok(()),
            Err(e) => return Err(e),
        };

        tracing::trace!("Received request: {:?}", request);

        let response = match dispatcher.execute(request) {
            Ok(value) => value,
            Err(e) => Value::Error(e.to_string()),
        };

        send_response(writer, &response)?;
    }
}

/// Encode and flush one reply
///
/// A reply that cannot be encoded is replaced by an error value, so a buggy
/// handler never garbles the stream or drops the connection.
fn send_response<W: Write>(writer: &mut W, response: &Value) -> Result<()> {
    let bytes = match encode_value(response) {
        Ok(bytes) => bytes,
        Err(KvError::Serialization(msg)) => {
            tracing::error!("Unencodable {} reply: {}", response.kind(), msg);
            encode_value(&Value::Error(format!("ERR unencodable reply: {}", msg)))?
        }
        Err(e) => return Err(e),
    };

    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn is_peer_gone(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}
