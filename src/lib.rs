//! # IDEC MicroSmart Maintenance Protocol Library
//!
//! A Rust client for the ASCII "maintenance" protocol spoken by IDEC
//! MicroSmart-family compact PLCs, over a serial link or a TCP socket.
//!
//! This is a **protocol-only** library: no polling, schedulers, or
//! application-level features. Each typed operation performs exactly one
//! half-duplex transaction (plus at most one BCC-mode negotiation retry).
//! No automatic retries, caching, or reconnection.
//!
//! ## Features
//!
//! - **Bit-exact framing**: `ENQ | device | cont | cmd | dtype | payload | BCC | CR`
//! - **BCC auto-negotiation**: detects whether the checksum covers the
//!   leading ENQ byte and locks the mode per session
//! - **Typed operations**: bits, words, 32-bit floats, timer blocks,
//!   error codes, counter presets, operating status
//! - **Two transports**: byte-stream serial and connection-per-call TCP
//! - **No panics**: all errors returned as [`Result<T, MaintError>`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use idec_maint::{Client, ClientConfig, Operand};
//!
//! fn main() -> idec_maint::Result<()> {
//!     // Serial link, device id "FF", BCC mode auto-detected
//!     let config = ClientConfig::default();
//!     let mut plc = Client::serial("/dev/ttyACM0", config)?;
//!
//!     // Read data register D100
//!     let value = plc.read_word(Operand::parse("D0100")?)?;
//!     println!("D0100 = {value}");
//!
//!     // Read internal relay bit M8070
//!     let bit = plc.read_bit(Operand::parse("M8070")?)?;
//!     println!("M8070 = {bit}");
//!
//!     // Pulse output Q7 using the enumerable alias
//!     plc.output("Q7", true)?;
//!     plc.output("Q7", false)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! Request: `0x05 | device(2 ASCII) | cont('0'|'1') | cmd(1) | dtype(1) | payload | BCC(2 hex) | 0x0D`
//!
//! Reply: `0x06 or 0x15 | device(2 ASCII) | cmd(1) | data | BCC(2 hex) | 0x0D`
//!
//! The BCC is the XOR of all preceding bytes. On requests it optionally
//! includes the leading `0x05` (mode-dependent, see [`BccMode`]); on
//! replies it always includes the leading control byte. Any ACK/NAK reply
//! whose checksum does not verify is a hard [`MaintError::ChecksumMismatch`],
//! never silently accepted.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, MaintError>`]. The library never
//! panics in public code.
//!
//! ```no_run
//! use idec_maint::{Client, ClientConfig, MaintError, Operand};
//!
//! # fn main() -> idec_maint::Result<()> {
//! let mut plc = Client::serial("/dev/ttyACM0", ClientConfig::default())?;
//!
//! match plc.read_word(Operand::parse("D0100")?) {
//!     Ok(value) => println!("D0100 = {value}"),
//!     Err(MaintError::ProtocolReject { code }) => {
//!         println!("request rejected, NAK code {code}");
//!     }
//!     Err(MaintError::ChecksumMismatch { received, computed }) => {
//!         println!("line noise: BCC {received:02X} != {computed:02X}");
//!     }
//!     Err(e) => println!("error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: raw TX/RX frames at `trace`,
//! BCC negotiation decisions at `debug`. Wire a logger such as
//! `env_logger` in the application to see them.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod address;
pub mod bcc;
mod client;
mod error;
mod frame;
mod status;
mod transport;

// Public re-exports
pub use address::{
    pad4, simple_io, simple_io_index, IoDirection, Operand, OperandClass, MAX_OPERAND,
};
pub use client::{
    Client, ClientConfig, TimerRecord, WordOrder, DEFAULT_DEVICE, MAX_ERROR_BYTES,
    MAX_TIMER_COUNT,
};
pub use error::{MaintError, Result};
pub use frame::{build_request, BccMode, Reply, ReplyKind, ACK, CR, ENQ, MIN_REPLY_LEN, NAK};
pub use status::{PlcStatus, STATUS_MIN_LEN};
pub use transport::{
    SerialTransport, TcpTransport, Transport, DEFAULT_BAUD, DEFAULT_TCP_PORT, DEFAULT_TIMEOUT,
    MAX_REPLY_LEN,
};
