//! Request framing and reply classification.
//!
//! # Wire format
//!
//! Request:
//! `ENQ(0x05) | device(2 ASCII) | cont('0'|'1') | cmd(1) | dtype(1) | payload | BCC(2 hex) | CR(0x0D)`
//!
//! Reply:
//! `ctrl(0x06 ACK | 0x15 NAK) | device(2 ASCII) | cmd(1) | data | BCC(2 hex) | CR(0x0D)`
//!
//! The request BCC covers either the full frame body including the leading
//! ENQ or the body alone, depending on the session's negotiated
//! [`BccMode`]. The reply BCC always covers everything from the control
//! byte up to (not including) the trailing checksum digits and CR.

use crate::bcc;
use crate::error::{MaintError, Result};

/// Leading marker byte of a request frame.
pub const ENQ: u8 = 0x05;
/// Acknowledge marker of a reply frame.
pub const ACK: u8 = 0x06;
/// Reject marker of a reply frame.
pub const NAK: u8 = 0x15;
/// Frame terminator.
pub const CR: u8 = 0x0D;

/// Echoed command character that turns an ACK into an error report.
pub(crate) const NG_COMMAND: char = '2';

/// Well-formedness floor for a reply buffer. Anything shorter cannot carry
/// the fixed fields and is classified malformed without further parsing.
pub const MIN_REPLY_LEN: usize = 6;

/// Whether the request BCC span includes the leading ENQ byte.
///
/// Some link adapters and CPU modules checksum the ENQ, others do not.
/// A session starts in `Auto` and locks itself to one of the fixed modes
/// after the first successful exchange (see
/// [`Client`](crate::Client)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BccMode {
    /// Detect the mode on the first transaction and lock it.
    #[default]
    Auto,
    /// Checksum covers ENQ plus the frame body.
    IncludeEnq,
    /// Checksum covers the frame body only.
    ExcludeEnq,
}

/// Builds a complete request frame ready for transmission.
///
/// # Errors
///
/// Returns [`MaintError::FrameError`] if the device id is not exactly
/// 2 ASCII characters, the continuation flag is not `'0'` or `'1'`, or the
/// command/data-type characters are not ASCII.
pub fn build_request(
    device: &str,
    cont: char,
    cmd: char,
    dtype: char,
    payload: &[u8],
    include_enq: bool,
) -> Result<Vec<u8>> {
    if device.len() != 2 || !device.is_ascii() {
        return Err(MaintError::frame_error(format!(
            "device id must be 2 ASCII characters, got {device:?}"
        )));
    }
    if cont != '0' && cont != '1' {
        return Err(MaintError::frame_error(format!(
            "continuation flag must be '0' or '1', got {cont:?}"
        )));
    }
    if !cmd.is_ascii() || !dtype.is_ascii() {
        return Err(MaintError::frame_error(format!(
            "command and data-type must be single ASCII characters, got {cmd:?}/{dtype:?}"
        )));
    }

    let mut body = Vec::with_capacity(5 + payload.len());
    body.extend_from_slice(device.as_bytes());
    body.push(cont as u8);
    body.push(cmd as u8);
    body.push(dtype as u8);
    body.extend_from_slice(payload);

    let checksum = if include_enq {
        let mut span = Vec::with_capacity(body.len() + 1);
        span.push(ENQ);
        span.extend_from_slice(&body);
        bcc::xor_bcc(&span)
    } else {
        bcc::xor_bcc(&body)
    };

    let mut frame = Vec::with_capacity(body.len() + 4);
    frame.push(ENQ);
    frame.extend_from_slice(&body);
    frame.extend_from_slice(&bcc::to_hex_ascii(checksum));
    frame.push(CR);
    Ok(frame)
}

/// Classification of a received reply buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Acknowledged, data payload valid.
    AckOk,
    /// Acknowledged, but the PLC reports an application-level error code.
    AckNg,
    /// Request rejected; carries a 2-character rejection code.
    Nak,
    /// Buffer does not parse as a well-formed frame.
    Malformed,
    /// No bytes received before the time budget ran out.
    Empty,
    /// Well-formed frame with an unrecognized control marker.
    Unknown,
}

impl std::fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReplyKind::AckOk => "ACK",
            ReplyKind::AckNg => "ACK-NG",
            ReplyKind::Nak => "NAK",
            ReplyKind::Malformed => "malformed",
            ReplyKind::Empty => "empty",
            ReplyKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A parsed and classified reply frame.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Classification of the reply.
    pub kind: ReplyKind,
    /// Raw bytes as received, terminator included.
    pub raw: Vec<u8>,
    /// Control marker byte, if the frame was long enough to carry one.
    pub ctrl: Option<u8>,
    /// Echoed device id.
    pub device: String,
    /// Echoed command character.
    pub command: char,
    /// Data field between the command echo and the checksum digits.
    pub data: Vec<u8>,
    /// Checksum parsed from the trailing hex digits.
    pub bcc_recv: Option<u8>,
    /// Checksum computed over the received bytes.
    pub bcc_calc: Option<u8>,
    /// Whether the received and computed checksums match.
    pub bcc_ok: bool,
    /// NAK rejection code or ACK-NG error code (first 2 data bytes).
    pub code: String,
}

impl Reply {
    fn unparsed(kind: ReplyKind, raw: &[u8]) -> Self {
        Self {
            kind,
            raw: raw.to_vec(),
            ctrl: None,
            device: String::new(),
            command: '\0',
            data: Vec::new(),
            bcc_recv: None,
            bcc_calc: None,
            bcc_ok: false,
            code: String::new(),
        }
    }

    /// Parses and classifies a received buffer.
    ///
    /// Never fails: buffers that do not form a valid frame come back as
    /// [`ReplyKind::Empty`] or [`ReplyKind::Malformed`]. Checksum
    /// validation is recorded in [`Reply::bcc_ok`]; deciding whether a
    /// mismatch is fatal is the caller's job.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::unparsed(ReplyKind::Empty, raw);
        }
        if raw.len() < MIN_REPLY_LEN || raw[raw.len() - 1] != CR {
            return Self::unparsed(ReplyKind::Malformed, raw);
        }

        let ctrl = raw[0];
        let device = String::from_utf8_lossy(&raw[1..3]).into_owned();
        let command = raw[3] as char;
        // At the 6-byte floor the checksum digits overlap the command echo
        // and the data field is empty.
        let data = raw[4..(raw.len() - 3).max(4)].to_vec();
        let bcc_ascii = &raw[raw.len() - 3..raw.len() - 1];

        let bcc_recv = match bcc::hex_pair_value(bcc_ascii) {
            Some(value) => value,
            None => return Self::unparsed(ReplyKind::Malformed, raw),
        };
        let bcc_calc = bcc::xor_bcc(&raw[..raw.len() - 3]);

        let mut reply = Self {
            kind: ReplyKind::Unknown,
            raw: raw.to_vec(),
            ctrl: Some(ctrl),
            device,
            command,
            data,
            bcc_recv: Some(bcc_recv),
            bcc_calc: Some(bcc_calc),
            bcc_ok: bcc_recv == bcc_calc,
            code: String::new(),
        };

        match ctrl {
            NAK => {
                reply.kind = ReplyKind::Nak;
                reply.code = leading_code(&reply.data);
            }
            ACK if reply.command == NG_COMMAND => {
                reply.kind = ReplyKind::AckNg;
                reply.code = leading_code(&reply.data);
            }
            ACK => reply.kind = ReplyKind::AckOk,
            _ => {}
        }
        reply
    }
}

fn leading_code(data: &[u8]) -> String {
    if data.len() >= 2 {
        String::from_utf8_lossy(&data[..2]).into_owned()
    } else {
        String::new()
    }
}
