//! Physical link transports for the maintenance protocol.
//!
//! The protocol layer only needs three things from a link: discard stale
//! input, send one complete frame, and collect a CR-terminated reply. The
//! [`Transport`] trait captures exactly that; the protocol layer knows
//! nothing about ports or sockets, and the transports know nothing about
//! frames beyond the terminator byte.
//!
//! Two concrete links are provided:
//!
//! - [`SerialTransport`]: a byte-stream link that reads one byte at a time
//!   until the terminator arrives or the time budget runs out.
//! - [`TcpTransport`]: a connection-per-call socket link that opens,
//!   sends, receives a single response chunk, and closes.
//!
//! A transport is exclusively owned by one session. Timeouts do not fail a
//! transaction at this layer: a short or empty buffer is returned as-is and
//! classified upstream.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use log::trace;

use crate::error::{MaintError, Result};
use crate::frame::CR;

/// Default per-read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default serial baud rate for the maintenance port.
pub const DEFAULT_BAUD: u32 = 19_200;

/// Default TCP port of the maintenance service.
pub const DEFAULT_TCP_PORT: u16 = 2101;

/// Byte-count ceiling for a single reply.
pub const MAX_REPLY_LEN: usize = 8192;

/// Receive chunk size for the socket transport.
const TCP_CHUNK: usize = 1024;

/// Multiplier applied to the timeout to bound a whole receive loop.
const RECV_BUDGET_FACTOR: u32 = 3;

/// A half-duplex byte channel carrying one request/reply exchange at a time.
pub trait Transport {
    /// Discards any unread input left over from a previous exchange.
    fn reset_input(&mut self) -> Result<()>;

    /// Sends one complete request frame.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Collects reply bytes until the CR terminator, the byte-count
    /// ceiling, or the time budget, whichever comes first.
    ///
    /// A timeout is not an error here: whatever arrived (possibly nothing)
    /// is returned for the frame codec to classify.
    fn recv_until_cr(&mut self) -> Result<Vec<u8>>;
}

/// Serial link reading the reply one byte at a time.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    timeout: Duration,
}

impl SerialTransport {
    /// Opens a serial port for maintenance-protocol use.
    ///
    /// The maintenance port runs 8 data bits, no parity, 1 stop bit.
    ///
    /// # Errors
    ///
    /// Returns a [`MaintError::Serial`] if the port cannot be opened or
    /// configured.
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(timeout)
            .open()?;
        Ok(Self { port, timeout })
    }

    /// Opens a serial port with the default baud rate and timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`MaintError::Serial`] if the port cannot be opened.
    pub fn open_default(path: &str) -> Result<Self> {
        Self::open(path, DEFAULT_BAUD, DEFAULT_TIMEOUT)
    }
}

impl Transport for SerialTransport {
    fn reset_input(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    fn recv_until_cr(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let deadline = Instant::now() + self.timeout * RECV_BUDGET_FACTOR;
        let mut byte = [0u8; 1];

        while buf.len() < MAX_REPLY_LEN {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    buf.push(byte[0]);
                    if byte[0] == CR {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(MaintError::Io(e)),
            }
            if Instant::now() >= deadline {
                trace!("receive budget exhausted with {} bytes buffered", buf.len());
                break;
            }
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Socket link that opens a fresh connection per exchange.
///
/// [`Transport::send`] connects and transmits; [`Transport::recv_until_cr`]
/// reads a single response chunk and closes the connection. There is no
/// persistent connection state between transactions.
pub struct TcpTransport {
    addr: SocketAddr,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Creates a socket transport targeting the given maintenance endpoint.
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            stream: None,
        }
    }

    /// Creates a socket transport with the default timeout.
    pub fn with_default_timeout(addr: SocketAddr) -> Self {
        Self::new(addr, DEFAULT_TIMEOUT)
    }

    /// Returns the remote endpoint address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for TcpTransport {
    fn reset_input(&mut self) -> Result<()> {
        // Connection-per-call: dropping the previous stream discards
        // anything the peer may still have queued.
        self.stream = None;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        let mut stream = TcpStream::connect_timeout(&self.addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.write_all(frame)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn recv_until_cr(&mut self) -> Result<Vec<u8>> {
        let mut stream = self.stream.take().ok_or_else(|| {
            MaintError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                "receive without a preceding send",
            ))
        })?;

        let mut buf = vec![0u8; TCP_CHUNK];
        match stream.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(Vec::new()),
            Err(e) => Err(MaintError::Io(e)),
        }
        // stream drops here, closing the per-call connection
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .finish()
    }
}
