//! High-level maintenance-protocol client.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! reading and writing PLC operands over a serial link or a TCP socket.
//!
//! # Overview
//!
//! Every typed operation executes exactly one transaction: build the
//! request frame, send it, collect the CR-terminated reply, parse and
//! classify it, validate the reply checksum, and decode the data field.
//! The single exception is the one-time BCC mode negotiation (below),
//! which may retry the same logical request once. There is no other
//! automatic retry, no caching, and no reconnection; those policies belong
//! to the application.
//!
//! # BCC mode negotiation
//!
//! Whether the request checksum covers the leading ENQ byte differs
//! between link adapters. In [`BccMode::Auto`] (the default) the first
//! transaction is attempted with the ENQ included; if the PLC answers NAK
//! with code `"10"`, the same request is retried once with the ENQ
//! excluded, and whichever variant succeeds becomes the session's mode for
//! good. Forcing [`BccMode::IncludeEnq`] or [`BccMode::ExcludeEnq`] skips
//! negotiation entirely.
//!
//! # Example
//!
//! ```no_run
//! use idec_maint::{Client, ClientConfig, Operand};
//!
//! fn main() -> idec_maint::Result<()> {
//!     let config = ClientConfig::default();
//!     let mut plc = Client::tcp("192.168.1.5:2101".parse().unwrap(), config);
//!
//!     let value = plc.read_word(Operand::parse("D0100")?)?;
//!     println!("D0100 = {value}");
//!
//!     plc.write_bit(Operand::parse("M0070")?, true)?;
//!     plc.output_index(7, true)?;
//!
//!     let temperature = plc.read_float(Operand::parse("D0200")?)?;
//!     println!("temperature = {temperature}");
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::address::{self, IoDirection, Operand};
use crate::bcc;
use crate::error::{MaintError, Result};
use crate::frame::{self, BccMode, Reply, ReplyKind};
use crate::status::PlcStatus;
use crate::transport::{
    SerialTransport, TcpTransport, Transport, DEFAULT_BAUD, DEFAULT_TIMEOUT,
};

/// Default device identifier.
pub const DEFAULT_DEVICE: &str = "FF";

/// NAK rejection code signalling a checksum-mode mismatch.
const NAK_BCC_MODE_MISMATCH: &str = "10";

/// Largest timer block readable in one request.
pub const MAX_TIMER_COUNT: u8 = 48;

/// Largest error-code block, in bytes, readable in one request.
pub const MAX_ERROR_BYTES: u8 = 12;

/// Word order used when a 32-bit float spans two registers.
///
/// The float's IEEE-754 bit pattern is split into a high and a low 16-bit
/// word; this flag selects which of the two sits at the lower operand
/// address. The same convention applies on both transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordOrder {
    /// Low-order word at the lower operand address (device default).
    #[default]
    LowFirst,
    /// High-order word at the lower operand address.
    HighFirst,
}

/// Configuration for creating a maintenance-protocol client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 2-character device identifier, fixed for the session.
    pub device: String,
    /// Initial BCC mode.
    pub bcc_mode: BccMode,
    /// Word order for float operations.
    pub word_order: WordOrder,
    /// In auto mode, number of failed detection attempts after which the
    /// session locks to [`BccMode::IncludeEnq`] instead of probing forever.
    /// `None` keeps probing on every call.
    pub auto_probe_limit: Option<u32>,
}

impl ClientConfig {
    /// Creates a configuration for the given device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MaintError::InvalidAddress`] unless the identifier is
    /// exactly 2 ASCII characters.
    pub fn new(device: &str) -> Result<Self> {
        if device.len() != 2 || !device.is_ascii() {
            return Err(MaintError::invalid_address(format!(
                "device id must be 2 ASCII characters, got {device:?}"
            )));
        }
        Ok(Self {
            device: device.to_ascii_uppercase(),
            bcc_mode: BccMode::Auto,
            word_order: WordOrder::LowFirst,
            auto_probe_limit: None,
        })
    }

    /// Forces a fixed BCC mode instead of auto-detection.
    pub fn with_bcc_mode(mut self, mode: BccMode) -> Self {
        self.bcc_mode = mode;
        self
    }

    /// Sets the float word order (default: low word first).
    pub fn with_word_order(mut self, order: WordOrder) -> Self {
        self.word_order = order;
        self
    }

    /// Caps the number of failed auto-mode detection attempts.
    pub fn with_auto_probe_limit(mut self, limit: u32) -> Self {
        self.auto_probe_limit = Some(limit);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE).expect("default device id is valid")
    }
}

/// One record of a timer information block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRecord {
    /// Timer operand number.
    pub number: u16,
    /// Current value.
    pub current: u16,
    /// Preset value.
    pub preset: u16,
    /// Status byte.
    pub status: u8,
}

/// Maintenance-protocol client owning a transport session.
///
/// Strictly synchronous and half-duplex: one request frame is outstanding
/// at a time, and the transport is exclusively owned. Apart from the
/// sticky BCC mode there is no session state; every operation is a fresh,
/// independent transaction.
pub struct Client<T: Transport> {
    transport: T,
    device: String,
    bcc_mode: BccMode,
    word_order: WordOrder,
    auto_probe_limit: Option<u32>,
    failed_probes: u32,
}

impl Client<SerialTransport> {
    /// Opens a serial session with default baud rate and timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`MaintError::Serial`] if the port cannot be opened.
    pub fn serial(path: &str, config: ClientConfig) -> Result<Self> {
        Self::serial_with(path, DEFAULT_BAUD, DEFAULT_TIMEOUT, config)
    }

    /// Opens a serial session with explicit baud rate and timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`MaintError::Serial`] if the port cannot be opened.
    pub fn serial_with(
        path: &str,
        baud: u32,
        timeout: Duration,
        config: ClientConfig,
    ) -> Result<Self> {
        let transport = SerialTransport::open(path, baud, timeout)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl Client<TcpTransport> {
    /// Creates a TCP session (connection-per-call) with the default timeout.
    pub fn tcp(addr: SocketAddr, config: ClientConfig) -> Self {
        Self::tcp_with(addr, DEFAULT_TIMEOUT, config)
    }

    /// Creates a TCP session with an explicit timeout.
    pub fn tcp_with(addr: SocketAddr, timeout: Duration, config: ClientConfig) -> Self {
        Self::with_transport(TcpTransport::new(addr, timeout), config)
    }
}

impl<T: Transport> Client<T> {
    /// Wraps an already-open transport in a client session.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            device: config.device,
            bcc_mode: config.bcc_mode,
            word_order: config.word_order,
            auto_probe_limit: config.auto_probe_limit,
            failed_probes: 0,
        }
    }

    /// Returns the session's current BCC mode.
    ///
    /// Starts as configured and, in auto mode, locks to a fixed mode after
    /// the first successful exchange.
    pub fn bcc_mode(&self) -> BccMode {
        self.bcc_mode
    }

    /// Returns the session's device identifier.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Performs one framed exchange with the given checksum span.
    ///
    /// An ACK/NAK-classified reply whose checksum does not verify is a
    /// hard error here, before any classification-dependent handling.
    fn exchange_once(
        &mut self,
        cmd: char,
        dtype: char,
        payload: &[u8],
        include_enq: bool,
    ) -> Result<Reply> {
        let request = frame::build_request(&self.device, '0', cmd, dtype, payload, include_enq)?;
        trace!("TX {:02X?}", request);

        self.transport.reset_input()?;
        self.transport.send(&request)?;
        let raw = self.transport.recv_until_cr()?;
        trace!("RX {:02X?}", raw);

        let reply = Reply::parse(&raw);
        if matches!(
            reply.kind,
            ReplyKind::AckOk | ReplyKind::AckNg | ReplyKind::Nak
        ) && !reply.bcc_ok
        {
            return Err(MaintError::checksum_mismatch(
                reply.bcc_recv.unwrap_or(0),
                reply.bcc_calc.unwrap_or(0),
            ));
        }
        Ok(reply)
    }

    /// Runs one transaction under the session's BCC mode, negotiating and
    /// locking the mode on first success when in auto mode.
    fn transact(&mut self, cmd: char, dtype: char, payload: &[u8]) -> Result<Reply> {
        match self.bcc_mode {
            BccMode::IncludeEnq => self.exchange_once(cmd, dtype, payload, true),
            BccMode::ExcludeEnq => self.exchange_once(cmd, dtype, payload, false),
            BccMode::Auto => {
                let reply = self.exchange_once(cmd, dtype, payload, true)?;
                if reply.kind == ReplyKind::Nak && reply.code == NAK_BCC_MODE_MISMATCH {
                    debug!("BCC mode mismatch (NAK 10), retrying with ENQ excluded");
                    let retry = self.exchange_once(cmd, dtype, payload, false)?;
                    if retry.kind == ReplyKind::AckOk {
                        debug!("BCC mode locked: checksum excludes ENQ");
                        self.bcc_mode = BccMode::ExcludeEnq;
                    } else {
                        self.note_failed_probe();
                    }
                    return Ok(retry);
                }
                if reply.kind == ReplyKind::AckOk {
                    debug!("BCC mode locked: checksum includes ENQ");
                    self.bcc_mode = BccMode::IncludeEnq;
                } else {
                    self.note_failed_probe();
                }
                Ok(reply)
            }
        }
    }

    fn note_failed_probe(&mut self) {
        self.failed_probes += 1;
        if let Some(limit) = self.auto_probe_limit {
            if self.failed_probes >= limit {
                warn!(
                    "BCC auto-detection failed {} time(s), locking to include-ENQ",
                    self.failed_probes
                );
                self.bcc_mode = BccMode::IncludeEnq;
            }
        }
    }

    /// Maps a non-OK classification to its error, once the checksum has
    /// already been verified.
    fn expect_ok(reply: &Reply) -> Result<()> {
        match reply.kind {
            ReplyKind::AckOk => Ok(()),
            ReplyKind::Nak => Err(MaintError::protocol_reject(reply.code.clone())),
            ReplyKind::AckNg => Err(MaintError::application_error(reply.code.clone())),
            other => Err(MaintError::unexpected_reply(format!(
                "reply classified as {other}"
            ))),
        }
    }

    // ---------------------------------------------------------------
    // Word operations
    // ---------------------------------------------------------------

    /// Reads a 16-bit word.
    ///
    /// # Errors
    ///
    /// Fails on NAK/ACK-NG replies, a checksum mismatch, or a data field
    /// that is not exactly 4 hex characters.
    pub fn read_word(&mut self, addr: Operand) -> Result<u16> {
        let payload = format!("{}02", addr.padded());
        let reply = self.transact('R', addr.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        decode_word(&reply.data)
    }

    /// Writes a 16-bit word and returns the value actually written.
    ///
    /// The value is masked with `& 0xFFFF` before encoding.
    pub fn write_word(&mut self, addr: Operand, value: u32) -> Result<u16> {
        let word = (value & 0xFFFF) as u16;
        let payload = format!("{}02{word:04X}", addr.padded());
        let reply = self.transact('W', addr.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        Ok(word)
    }

    /// Reads a block of contiguous 16-bit words.
    ///
    /// # Errors
    ///
    /// Fails before sending if `count` is 0 or above 127 (the byte count
    /// field holds at most 0xFF bytes).
    pub fn read_words(&mut self, start: Operand, count: u8) -> Result<Vec<u16>> {
        if count == 0 || count > 127 {
            return Err(MaintError::invalid_address(format!(
                "word count must be 1..=127, got {count}"
            )));
        }
        let nbytes = u32::from(count) * 2;
        let payload = format!("{}{nbytes:02X}", start.padded());
        let reply = self.transact('R', start.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        decode_word_run(&reply.data, count as usize)
    }

    /// Writes a counter preset, a 16-bit word write with the counter type
    /// letter.
    pub fn write_counter(&mut self, counter: u16, preset: u32) -> Result<u16> {
        self.write_word(Operand::new('C', counter)?, preset)
    }

    // ---------------------------------------------------------------
    // Bit operations
    // ---------------------------------------------------------------

    /// Reads a single bit from one of the bit classes X/Y/M/R.
    ///
    /// # Errors
    ///
    /// Fails if the operand is not bit-class, or if the reply data field
    /// is anything other than a single `'0'` or `'1'`.
    pub fn read_bit(&mut self, addr: Operand) -> Result<bool> {
        let dtype = addr.bit_letter()?;
        let payload = addr.padded();
        let reply = self.transact('R', dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        match reply.data.as_slice() {
            b"0" => Ok(false),
            b"1" => Ok(true),
            other => Err(MaintError::unexpected_reply(format!(
                "bit payload must be '0' or '1', got {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Writes a single bit and returns the value accepted.
    pub fn write_bit(&mut self, addr: Operand, on: bool) -> Result<bool> {
        let dtype = addr.bit_letter()?;
        let payload = format!("{}{}", addr.padded(), if on { '1' } else { '0' });
        let reply = self.transact('W', dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        Ok(on)
    }

    /// Reads a block of contiguous bits.
    pub fn read_bits(&mut self, start: Operand, count: u8) -> Result<Vec<bool>> {
        if count == 0 {
            return Err(MaintError::invalid_address("bit count must be at least 1"));
        }
        let dtype = start.bit_letter()?;
        let payload = format!("{}{count:02X}", start.padded());
        let reply = self.transact('R', dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        if reply.data.len() != count as usize {
            return Err(MaintError::unexpected_reply(format!(
                "bit block length {} does not match requested count {count}",
                reply.data.len()
            )));
        }
        reply
            .data
            .iter()
            .map(|&c| match c {
                b'0' => Ok(false),
                b'1' => Ok(true),
                other => Err(MaintError::unexpected_reply(format!(
                    "bit block must contain only '0'/'1', got {:?}",
                    other as char
                ))),
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Simplified enumerable I/O
    // ---------------------------------------------------------------

    /// Switches an output by its enumerable alias (`"Q7"`, `"Y0007"`).
    pub fn output(&mut self, io: &str, on: bool) -> Result<bool> {
        let operand = address::simple_io(io, IoDirection::Output)?;
        self.output_operand(operand, on)
    }

    /// Switches an output by bare index (`7` means `Q7`).
    pub fn output_index(&mut self, index: u16, on: bool) -> Result<bool> {
        let operand = address::simple_io_index(index, IoDirection::Output)?;
        self.output_operand(operand, on)
    }

    /// Reads an input by its enumerable alias (`"I7"`, `"X0007"`).
    pub fn input(&mut self, io: &str) -> Result<bool> {
        let operand = address::simple_io(io, IoDirection::Input)?;
        self.read_bit(operand)
    }

    /// Reads an input by bare index (`7` means `I7`).
    pub fn input_index(&mut self, index: u16) -> Result<bool> {
        let operand = address::simple_io_index(index, IoDirection::Input)?;
        self.read_bit(operand)
    }

    fn output_operand(&mut self, operand: Operand, on: bool) -> Result<bool> {
        // Exact 5-character payload, not the generic bit-write encoding.
        let payload = format!("{}{}", operand.padded(), if on { '1' } else { '0' });
        debug_assert_eq!(payload.len(), 5);
        let reply = self.transact('W', 'y', payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        Ok(on)
    }

    // ---------------------------------------------------------------
    // Timer / error blocks
    // ---------------------------------------------------------------

    /// Reads `count` consecutive timer information records.
    ///
    /// Each record on the wire is 10 hex characters: current value (4),
    /// preset (4), status (2).
    ///
    /// # Errors
    ///
    /// Fails before sending if `count` is outside `1..=48`, and on a reply
    /// whose data field is not exactly `10 * count` hex characters.
    pub fn read_timer(&mut self, start: u16, count: u8) -> Result<Vec<TimerRecord>> {
        if count == 0 || count > MAX_TIMER_COUNT {
            return Err(MaintError::invalid_address(format!(
                "timer count must be 1..={MAX_TIMER_COUNT}, got {count}"
            )));
        }
        let payload = format!("{}{count:02X}", address::pad4(start)?);
        let reply = self.transact('R', '_', payload.as_bytes())?;
        Self::expect_ok(&reply)?;

        let expected = 10 * count as usize;
        if reply.data.len() != expected || !bcc::is_hex_ascii(&reply.data) {
            return Err(MaintError::unexpected_reply(format!(
                "timer block must be {expected} hex chars, got {} ({:?})",
                reply.data.len(),
                String::from_utf8_lossy(&reply.data)
            )));
        }

        let mut records = Vec::with_capacity(count as usize);
        for (i, block) in reply.data.chunks_exact(10).enumerate() {
            records.push(TimerRecord {
                number: start + i as u16,
                current: bcc::hex_word(&block[0..4]).expect("validated hex"),
                preset: bcc::hex_word(&block[4..8]).expect("validated hex"),
                status: bcc::hex_pair_value(&block[8..10]).expect("validated hex"),
            });
        }
        Ok(records)
    }

    /// Reads the error-code block as 16-bit words.
    ///
    /// # Errors
    ///
    /// Fails before sending unless `nbytes` is even and within `2..=12`.
    pub fn read_error(&mut self, addr: u16, nbytes: u8) -> Result<Vec<u16>> {
        if nbytes < 2 || nbytes > MAX_ERROR_BYTES || nbytes % 2 != 0 {
            return Err(MaintError::invalid_address(format!(
                "error byte count must be even and 2..={MAX_ERROR_BYTES}, got {nbytes}"
            )));
        }
        let payload = format!("{}{nbytes:02X}", address::pad4(addr)?);
        let reply = self.transact('R', 'E', payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        decode_word_run(&reply.data, nbytes as usize / 2)
    }

    // ---------------------------------------------------------------
    // Float operations (2 registers)
    // ---------------------------------------------------------------

    /// Reads an IEEE-754 single-precision float from two consecutive
    /// registers, honoring the configured [`WordOrder`].
    pub fn read_float(&mut self, addr: Operand) -> Result<f32> {
        let payload = format!("{}04", addr.padded());
        let reply = self.transact('R', addr.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;

        if reply.data.len() != 8 || !bcc::is_hex_ascii(&reply.data) {
            return Err(MaintError::unexpected_reply(format!(
                "float payload must be 8 hex chars, got {:?}",
                String::from_utf8_lossy(&reply.data)
            )));
        }
        let w0 = bcc::hex_word(&reply.data[0..4]).expect("validated hex");
        let w1 = bcc::hex_word(&reply.data[4..8]).expect("validated hex");
        Ok(self.float_from_words(w0, w1))
    }

    /// Reads a block of contiguous 2-register floats.
    pub fn read_floats(&mut self, start: Operand, count: u8) -> Result<Vec<f32>> {
        if count == 0 || count > 63 {
            return Err(MaintError::invalid_address(format!(
                "float count must be 1..=63, got {count}"
            )));
        }
        let nbytes = u32::from(count) * 4;
        let payload = format!("{}{nbytes:02X}", start.padded());
        let reply = self.transact('R', start.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;

        let expected = 8 * count as usize;
        if reply.data.len() != expected || !bcc::is_hex_ascii(&reply.data) {
            return Err(MaintError::unexpected_reply(format!(
                "float block must be {expected} hex chars, got {}",
                reply.data.len()
            )));
        }
        let mut values = Vec::with_capacity(count as usize);
        for chunk in reply.data.chunks_exact(8) {
            let w0 = bcc::hex_word(&chunk[0..4]).expect("validated hex");
            let w1 = bcc::hex_word(&chunk[4..8]).expect("validated hex");
            values.push(self.float_from_words(w0, w1));
        }
        Ok(values)
    }

    /// Assembles a float from the two register words as they appear on the
    /// wire, in the session's configured word order.
    fn float_from_words(&self, w0: u16, w1: u16) -> f32 {
        let (low, high) = match self.word_order {
            WordOrder::LowFirst => (w0, w1),
            WordOrder::HighFirst => (w1, w0),
        };
        f32::from_bits((u32::from(high) << 16) | u32::from(low))
    }

    /// Writes an IEEE-754 single-precision float into two consecutive
    /// registers and returns the value as provided.
    pub fn write_float(&mut self, addr: Operand, value: f32) -> Result<f32> {
        let bits = value.to_bits();
        let high = (bits >> 16) as u16;
        let low = (bits & 0xFFFF) as u16;
        let (w0, w1) = match self.word_order {
            WordOrder::LowFirst => (low, high),
            WordOrder::HighFirst => (high, low),
        };
        let payload = format!("{}04{w0:04X}{w1:04X}", addr.padded());
        let reply = self.transact('W', addr.dtype, payload.as_bytes())?;
        Self::expect_ok(&reply)?;
        Ok(value)
    }

    // ---------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------

    /// Reads the PLC operating status (RS34).
    pub fn read_status(&mut self) -> Result<PlcStatus> {
        let reply = self.transact('R', 'S', b"34")?;
        Self::expect_ok(&reply)?;
        PlcStatus::decode(&reply.data)
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("device", &self.device)
            .field("bcc_mode", &self.bcc_mode)
            .field("word_order", &self.word_order)
            .finish_non_exhaustive()
    }
}

/// Decodes a data field that must be exactly one 4-hex-character word.
fn decode_word(data: &[u8]) -> Result<u16> {
    bcc::hex_word(data).ok_or_else(|| {
        MaintError::unexpected_reply(format!(
            "word payload must be 4 hex chars, got {:?}",
            String::from_utf8_lossy(data)
        ))
    })
}

/// Decodes a data field of `expected` consecutive 4-hex-character words.
fn decode_word_run(data: &[u8], expected: usize) -> Result<Vec<u16>> {
    if data.len() != expected * 4 || !bcc::is_hex_ascii(data) {
        return Err(MaintError::unexpected_reply(format!(
            "expected {expected} hex words ({} chars), got {:?}",
            expected * 4,
            String::from_utf8_lossy(data)
        )));
    }
    Ok(data
        .chunks_exact(4)
        .map(|chunk| bcc::hex_word(chunk).expect("validated hex"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ACK, CR, NAK};
    use std::collections::VecDeque;

    /// Scripted transport: records sent frames, pops queued replies.
    struct MockTransport {
        sent: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
    }

    impl MockTransport {
        fn new(replies: Vec<Vec<u8>>) -> Self {
            Self {
                sent: Vec::new(),
                replies: replies.into(),
            }
        }
    }

    impl Transport for MockTransport {
        fn reset_input(&mut self) -> Result<()> {
            Ok(())
        }

        fn send(&mut self, frame: &[u8]) -> Result<()> {
            self.sent.push(frame.to_vec());
            Ok(())
        }

        fn recv_until_cr(&mut self) -> Result<Vec<u8>> {
            Ok(self.replies.pop_front().unwrap_or_default())
        }
    }

    fn reply_frame(ctrl: u8, device: &str, cmd: char, data: &[u8]) -> Vec<u8> {
        let mut frame = vec![ctrl];
        frame.extend_from_slice(device.as_bytes());
        frame.push(cmd as u8);
        frame.extend_from_slice(data);
        let checksum = bcc::xor_bcc(&frame);
        frame.extend_from_slice(&bcc::to_hex_ascii(checksum));
        frame.push(CR);
        frame
    }

    fn ack(data: &[u8]) -> Vec<u8> {
        reply_frame(ACK, "FF", 'R', data)
    }

    fn client(replies: Vec<Vec<u8>>) -> Client<MockTransport> {
        Client::with_transport(MockTransport::new(replies), ClientConfig::default())
    }

    fn d(addr: &str) -> Operand {
        Operand::parse(addr).unwrap()
    }

    #[test]
    fn test_read_word_locks_include_mode() {
        let mut plc = client(vec![ack(b"1234")]);
        let value = plc.read_word(d("D0100")).unwrap();
        assert_eq!(value, 0x1234);
        assert_eq!(plc.bcc_mode(), BccMode::IncludeEnq);

        let expected =
            frame::build_request("FF", '0', 'R', 'D', b"010002", true).unwrap();
        assert_eq!(plc.transport.sent, vec![expected]);
    }

    #[test]
    fn test_read_word_rejects_bad_hex() {
        let mut plc = client(vec![ack(b"12G4")]);
        assert!(matches!(
            plc.read_word(d("D0100")),
            Err(MaintError::UnexpectedReply { .. })
        ));
    }

    #[test]
    fn test_negotiation_nak10_locks_exclude_mode() {
        let mut plc = client(vec![
            reply_frame(NAK, "FF", 'R', b"10"),
            ack(b"1234"),
            ack(b"5678"),
        ]);

        assert_eq!(plc.read_word(d("D0100")).unwrap(), 0x1234);
        assert_eq!(plc.bcc_mode(), BccMode::ExcludeEnq);

        // Subsequent transaction: one attempt, ENQ excluded from the span.
        assert_eq!(plc.read_word(d("D0200")).unwrap(), 0x5678);
        assert_eq!(plc.transport.sent.len(), 3);

        let include = frame::build_request("FF", '0', 'R', 'D', b"010002", true).unwrap();
        let exclude = frame::build_request("FF", '0', 'R', 'D', b"010002", false).unwrap();
        assert_eq!(plc.transport.sent[0], include);
        assert_eq!(plc.transport.sent[1], exclude);
        assert_eq!(
            plc.transport.sent[2],
            frame::build_request("FF", '0', 'R', 'D', b"020002", false).unwrap()
        );
    }

    #[test]
    fn test_other_nak_code_keeps_auto_mode() {
        let mut plc = client(vec![reply_frame(NAK, "FF", 'R', b"21")]);
        match plc.read_word(d("D0100")) {
            Err(MaintError::ProtocolReject { code }) => assert_eq!(code, "21"),
            other => panic!("expected ProtocolReject, got {other:?}"),
        }
        assert_eq!(plc.bcc_mode(), BccMode::Auto);
        assert_eq!(plc.transport.sent.len(), 1);
    }

    #[test]
    fn test_forced_mode_never_negotiates() {
        let config = ClientConfig::default().with_bcc_mode(BccMode::ExcludeEnq);
        let mut plc = Client::with_transport(
            MockTransport::new(vec![reply_frame(NAK, "FF", 'R', b"10")]),
            config,
        );
        assert!(matches!(
            plc.read_word(d("D0100")),
            Err(MaintError::ProtocolReject { .. })
        ));
        assert_eq!(plc.transport.sent.len(), 1);
        assert_eq!(plc.bcc_mode(), BccMode::ExcludeEnq);
    }

    #[test]
    fn test_auto_probe_limit_locks_include() {
        let config = ClientConfig::default().with_auto_probe_limit(2);
        let mut plc = Client::with_transport(
            MockTransport::new(vec![
                reply_frame(NAK, "FF", 'R', b"21"),
                reply_frame(NAK, "FF", 'R', b"21"),
            ]),
            config,
        );
        assert!(plc.read_word(d("D0100")).is_err());
        assert_eq!(plc.bcc_mode(), BccMode::Auto);
        assert!(plc.read_word(d("D0100")).is_err());
        assert_eq!(plc.bcc_mode(), BccMode::IncludeEnq);
    }

    #[test]
    fn test_ack_ng_maps_to_application_error() {
        let mut plc = client(vec![reply_frame(ACK, "FF", '2', b"06")]);
        match plc.read_word(d("D0100")) {
            Err(MaintError::ApplicationError { code }) => assert_eq!(code, "06"),
            other => panic!("expected ApplicationError, got {other:?}"),
        }
    }

    #[test]
    fn test_checksum_mismatch_is_fatal() {
        let mut bad = ack(b"1234");
        bad[5] ^= 0x01; // corrupt the data field, keep the checksum digits
        let mut plc = client(vec![bad]);
        assert!(matches!(
            plc.read_word(d("D0100")),
            Err(MaintError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_reply_is_unexpected() {
        let mut plc = client(vec![]);
        match plc.read_word(d("D0100")) {
            Err(MaintError::UnexpectedReply { reason }) => {
                assert!(reason.contains("empty"), "reason was {reason:?}");
            }
            other => panic!("expected UnexpectedReply, got {other:?}"),
        }
    }

    #[test]
    fn test_write_word_masks_value() {
        let mut plc = client(vec![ack(b"")]);
        let written = plc.write_word(d("D0100"), 0x1ABCD).unwrap();
        assert_eq!(written, 0xABCD);

        let sent = &plc.transport.sent[0];
        let body = &sent[1..sent.len() - 3];
        assert_eq!(body, b"FF0WD010002ABCD");
    }

    #[test]
    fn test_read_bit_uses_lowercase_letter() {
        let mut plc = client(vec![ack(b"1")]);
        assert!(plc.read_bit(d("M8070")).unwrap());

        let sent = &plc.transport.sent[0];
        let body = &sent[1..sent.len() - 3];
        assert_eq!(body, b"FF0Rm8070");
    }

    #[test]
    fn test_read_bit_rejects_non_binary_payload() {
        let mut plc = client(vec![ack(b"2")]);
        assert!(matches!(
            plc.read_bit(d("M8070")),
            Err(MaintError::UnexpectedReply { .. })
        ));
    }

    #[test]
    fn test_write_bit_payload() {
        let mut plc = client(vec![ack(b"")]);
        assert!(plc.write_bit(d("Y0000"), true).unwrap());

        let sent = &plc.transport.sent[0];
        let body = &sent[1..sent.len() - 3];
        assert_eq!(body, b"FF0Wy00001");
    }

    #[test]
    fn test_output_exact_five_char_payload() {
        let mut plc = client(vec![ack(b""), ack(b"")]);
        plc.output_index(0, true).unwrap();
        plc.output("Q7", true).unwrap();

        let body0 = &plc.transport.sent[0][1..plc.transport.sent[0].len() - 3];
        let body1 = &plc.transport.sent[1][1..plc.transport.sent[1].len() - 3];
        assert_eq!(body0, b"FF0Wy00001");
        assert_eq!(body1, b"FF0Wy00071");
    }

    #[test]
    fn test_input_reads_x_bit() {
        let mut plc = client(vec![ack(b"0")]);
        assert!(!plc.input_index(7).unwrap());

        let sent = &plc.transport.sent[0];
        let body = &sent[1..sent.len() - 3];
        assert_eq!(body, b"FF0Rx0007");
    }

    #[test]
    fn test_read_timer_slices_records() {
        let data = b"0001000A010002000B000003000C10";
        let mut plc = client(vec![ack(data)]);
        let records = plc.read_timer(5, 3).unwrap();
        assert_eq!(
            records,
            vec![
                TimerRecord {
                    number: 5,
                    current: 0x0001,
                    preset: 0x000A,
                    status: 0x01
                },
                TimerRecord {
                    number: 6,
                    current: 0x0002,
                    preset: 0x000B,
                    status: 0x00
                },
                TimerRecord {
                    number: 7,
                    current: 0x0003,
                    preset: 0x000C,
                    status: 0x10
                },
            ]
        );
    }

    #[test]
    fn test_read_timer_count_validated_before_send() {
        let mut plc = client(vec![]);
        assert!(plc.read_timer(0, 0).is_err());
        assert!(plc.read_timer(0, 49).is_err());
        assert!(plc.transport.sent.is_empty());
    }

    #[test]
    fn test_read_timer_length_mismatch() {
        let mut plc = client(vec![ack(b"0001000A01")]);
        assert!(matches!(
            plc.read_timer(0, 2),
            Err(MaintError::UnexpectedReply { .. })
        ));
    }

    #[test]
    fn test_write_counter_delegates_to_word_write() {
        let mut plc = client(vec![ack(b"")]);
        assert_eq!(plc.write_counter(99, 500).unwrap(), 500);

        let sent = &plc.transport.sent[0];
        let body = &sent[1..sent.len() - 3];
        assert_eq!(body, b"FF0WC00990201F4"); // "0099" + "02" + "01F4"
    }

    #[test]
    fn test_read_error_block() {
        let mut plc = client(vec![ack(b"12345678")]);
        let words = plc.read_error(0, 4).unwrap();
        assert_eq!(words, vec![0x1234, 0x5678]);
    }

    #[test]
    fn test_read_error_validation() {
        let mut plc = client(vec![]);
        assert!(plc.read_error(0, 0).is_err());
        assert!(plc.read_error(0, 3).is_err());
        assert!(plc.read_error(0, 14).is_err());
        assert!(plc.transport.sent.is_empty());
    }

    #[test]
    fn test_read_words_block() {
        let mut plc = client(vec![ack(b"12345678")]);
        let words = plc.read_words(d("D0100"), 2).unwrap();
        assert_eq!(words, vec![0x1234, 0x5678]);

        let body = &plc.transport.sent[0][1..plc.transport.sent[0].len() - 3];
        assert_eq!(body, b"FF0RD010004");
    }

    #[test]
    fn test_read_bits_block() {
        let mut plc = client(vec![ack(b"0110")]);
        let bits = plc.read_bits(d("M0000"), 4).unwrap();
        assert_eq!(bits, vec![false, true, true, false]);
    }

    #[test]
    fn test_read_bits_rejects_non_binary() {
        let mut plc = client(vec![ack(b"0120")]);
        assert!(plc.read_bits(d("M0000"), 4).is_err());
    }

    #[test]
    fn test_write_then_read_float_low_first() {
        // 1.0f32 = 0x3F800000: high word 0x3F80, low word 0x0000.
        let mut plc = client(vec![ack(b""), ack(b"00003F80")]);
        plc.write_float(d("D0100"), 1.0).unwrap();

        let body = &plc.transport.sent[0][1..plc.transport.sent[0].len() - 3];
        assert_eq!(body, b"FF0WD01000400003F80");

        let value = plc.read_float(d("D0100")).unwrap();
        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_float_word_orders_disagree() {
        let raw = b"00003F80";
        let mut low_first = client(vec![ack(raw)]);
        let a = low_first.read_float(d("D0100")).unwrap();

        let config = ClientConfig::default().with_word_order(WordOrder::HighFirst);
        let mut high_first = Client::with_transport(MockTransport::new(vec![ack(raw)]), config);
        let b = high_first.read_float(d("D0100")).unwrap();

        assert_eq!(a, 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_write_float_high_first() {
        let config = ClientConfig::default().with_word_order(WordOrder::HighFirst);
        let mut plc = Client::with_transport(MockTransport::new(vec![ack(b"")]), config);
        plc.write_float(d("D0100"), 1.0).unwrap();

        let body = &plc.transport.sent[0][1..plc.transport.sent[0].len() - 3];
        assert_eq!(body, b"FF0WD0100043F800000");
    }

    #[test]
    fn test_read_floats_block() {
        // Two floats, low word first: 1.0 then 2.0 (0x40000000).
        let mut plc = client(vec![ack(b"00003F8000004000")]);
        let values = plc.read_floats(d("D0100"), 2).unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_read_status() {
        let mut plc = client(vec![ack(b"0003")]);
        let status = plc.read_status().unwrap();
        assert!(status.is_running());
        assert_eq!(status.cpu_description(), "24-I/O");

        let body = &plc.transport.sent[0][1..plc.transport.sent[0].len() - 3];
        assert_eq!(body, b"FF0RS34");
    }

    #[test]
    fn test_config_rejects_bad_device_id() {
        assert!(ClientConfig::new("F").is_err());
        assert!(ClientConfig::new("FFF").is_err());
        assert!(ClientConfig::new("F\u{00C4}").is_err());
        assert_eq!(ClientConfig::new("ff").unwrap().device, "FF");
    }
}
