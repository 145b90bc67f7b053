//! Error types for the maintenance protocol.

use std::io;
use thiserror::Error;

/// Result type alias for maintenance-protocol operations.
pub type Result<T> = std::result::Result<T, MaintError>;

/// Errors that can occur while talking to the PLC.
///
/// Address and frame errors are raised before any bytes reach the wire.
/// [`MaintError::ProtocolReject`] and [`MaintError::ApplicationError`] carry
/// the 2-character code echoed by the PLC. A [`MaintError::ChecksumMismatch`]
/// is always fatal for the transaction and is never retried automatically.
#[derive(Debug, Error)]
pub enum MaintError {
    /// Invalid operand address or data-type letter, detected before any I/O.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Description of the addressing error.
        reason: String,
    },

    /// Request frame could not be constructed, detected before send.
    #[error("frame error: {reason}")]
    FrameError {
        /// Description of the framing error.
        reason: String,
    },

    /// The PLC rejected the request with a NAK.
    #[error("request rejected (NAK), code {code}")]
    ProtocolReject {
        /// 2-character rejection code from the reply data field.
        code: String,
    },

    /// The PLC acknowledged the request but reported an application error.
    #[error("PLC reported error code {code}")]
    ApplicationError {
        /// 2-character error code from the reply data field.
        code: String,
    },

    /// Reply checksum did not match the received checksum digits.
    #[error("reply BCC mismatch: received 0x{received:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch {
        /// BCC value parsed from the reply's trailing hex digits.
        received: u8,
        /// BCC value computed over the reply bytes.
        computed: u8,
    },

    /// Reply did not match the shape a successful operation requires.
    #[error("unexpected reply: {reason}")]
    UnexpectedReply {
        /// Description of what was wrong with the reply.
        reason: String,
    },

    /// Communication timeout.
    #[error("communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl MaintError {
    /// Creates a new `InvalidAddress` error.
    pub fn invalid_address(reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            reason: reason.into(),
        }
    }

    /// Creates a new `FrameError`.
    pub fn frame_error(reason: impl Into<String>) -> Self {
        Self::FrameError {
            reason: reason.into(),
        }
    }

    /// Creates a new `ProtocolReject` from a NAK rejection code.
    pub fn protocol_reject(code: impl Into<String>) -> Self {
        Self::ProtocolReject { code: code.into() }
    }

    /// Creates a new `ApplicationError` from an ACK-NG error code.
    pub fn application_error(code: impl Into<String>) -> Self {
        Self::ApplicationError { code: code.into() }
    }

    /// Creates a new `ChecksumMismatch` error.
    pub fn checksum_mismatch(received: u8, computed: u8) -> Self {
        Self::ChecksumMismatch { received, computed }
    }

    /// Creates a new `UnexpectedReply` error.
    pub fn unexpected_reply(reason: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            reason: reason.into(),
        }
    }
}
