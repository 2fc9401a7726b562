//! Connection Handler
//!
//! Handles individual client connections: a buffered line loop that
//! reads one request, dispatches it to the index, writes the response,
//! and repeats until the client disconnects or shutdown is signaled.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::index::IndexStore;
use crate::protocol::{parse_request, Command, Response};

/// Outcome of one framed read
enum LineRead {
    /// A complete line within the length limit, terminator stripped
    Line,
    /// A line that exceeded the length limit; its bytes were discarded
    /// through the terminator
    Overlong,
    /// The client closed the connection
    Eof,
    /// Server shutdown was signaled while waiting for data
    Cancelled,
}

/// Handles a single client connection
pub struct Connection {
    stream: TcpStream,
    peer_addr: String,
    store: Arc<IndexStore>,
    shutdown: Arc<AtomicBool>,
    max_line_len: usize,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// The socket read timeout doubles as the shutdown poll interval:
    /// a timed-out read is not an error, just a chance to notice the
    /// shutdown flag before blocking again.
    pub fn new(
        stream: TcpStream,
        store: Arc<IndexStore>,
        shutdown: Arc<AtomicBool>,
        max_line_len: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());

        // Accepted sockets can inherit the listener's non-blocking flag
        // on some platforms; the read loop relies on blocking reads.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(poll_interval))?;

        Ok(Self {
            stream,
            peer_addr,
            store,
            shutdown,
            max_line_len,
        })
    }

    /// The remote peer address, for logging
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Requests and responses are strictly ordered one-to-one; the
    /// synchronous read-then-write loop is the back-pressure mechanism.
    pub fn handle(&mut self) -> Result<()> {
        let mut reader = BufReader::new(self.stream.try_clone()?);
        let mut line = Vec::new();

        loop {
            line.clear();
            match self.read_line(&mut reader, &mut line)? {
                LineRead::Eof => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                LineRead::Cancelled => {
                    tracing::debug!("Closing {} for shutdown", self.peer_addr);
                    return Ok(());
                }
                LineRead::Overlong => {
                    self.write_response(Response::Error)?;
                }
                LineRead::Line => {
                    let response = self.handle_line(&line);
                    self.write_response(response)?;
                }
            }
        }
    }

    /// Parse and dispatch a single request line
    fn handle_line(&self, line: &[u8]) -> Response {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(_) => return Response::Error,
        };

        match parse_request(line) {
            Ok(command) => dispatch(&self.store, command),
            Err(e) => {
                tracing::debug!("Malformed request from {}: {}", self.peer_addr, e);
                Response::Error
            }
        }
    }

    /// Read one `\n`-terminated line into `buf`, stripping the terminator
    ///
    /// Returns `Overlong` once a line outgrows the limit, after consuming
    /// the rest of it so the session can resume on the next line.
    fn read_line(&self, reader: &mut BufReader<TcpStream>, buf: &mut Vec<u8>) -> Result<LineRead> {
        loop {
            match reader.read_until(b'\n', buf) {
                Ok(0) => {
                    // EOF; any unterminated partial line is dropped
                    return Ok(LineRead::Eof);
                }
                Ok(_) if buf.last() == Some(&b'\n') => {
                    buf.pop();
                    if buf.len() >= self.max_line_len {
                        return Ok(LineRead::Overlong);
                    }
                    return Ok(LineRead::Line);
                }
                Ok(_) => {
                    if buf.len() >= self.max_line_len {
                        return self.discard_line(reader);
                    }
                    // Partial line before a timeout boundary; keep reading
                }
                Err(e) => match self.classify(e)? {
                    Some(result) => return Ok(result),
                    None => continue,
                },
            }
        }
    }

    /// Consume and drop bytes through the next `\n`
    fn discard_line(&self, reader: &mut BufReader<TcpStream>) -> Result<LineRead> {
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            match reader.read_until(b'\n', &mut scratch) {
                Ok(0) => return Ok(LineRead::Eof),
                Ok(_) if scratch.last() == Some(&b'\n') => return Ok(LineRead::Overlong),
                Ok(_) => {}
                Err(e) => match self.classify(e)? {
                    Some(result) => return Ok(result),
                    None => continue,
                },
            }
        }
    }

    /// Sort a read error into retry (None), a loop outcome, or a real error
    fn classify(&self, e: std::io::Error) -> Result<Option<LineRead>> {
        use std::io::ErrorKind;

        match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                if self.shutdown.load(Ordering::Relaxed) {
                    Ok(Some(LineRead::Cancelled))
                } else {
                    Ok(None)
                }
            }
            ErrorKind::Interrupted => Ok(None),
            _ => Err(e.into()),
        }
    }

    fn write_response(&mut self, response: Response) -> Result<()> {
        self.stream.write_all(response.as_line().as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }
}

/// Route a parsed command to the store and map the outcome
fn dispatch(store: &IndexStore, command: Command) -> Response {
    match command {
        Command::Index { package, deps } => Response::from_outcome(store.index(&package, &deps)),
        Command::Remove { package } => Response::from_outcome(store.remove(&package)),
        Command::Query { package } => Response::from_outcome(store.query(&package)),
    }
}
