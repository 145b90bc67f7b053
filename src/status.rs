//! PLC operating-status decoding.
//!
//! The `RS34` request (`R` command, dtype `'S'`, payload `"34"`) returns an
//! ASCII data field with four fixed-position status characters:
//!
//! | Position | Field | Values |
//! |---|---|---|
//! | 0 | run/stop | `'0'` run, `'1'` stop |
//! | 1 | timer/counter preset changed | `'0'` no, `'1'` yes |
//! | 2 | user program protection | `'0'..='3'` |
//! | 3 | CPU module type code | `'0'..='4'`, `'6'` |
//!
//! Any trailing bytes after position 3 are kept verbatim in
//! [`PlcStatus::extra`].

use crate::error::{MaintError, Result};

/// Minimum data-field length of a well-formed RS34 reply.
pub const STATUS_MIN_LEN: usize = 4;

/// Decoded PLC operating status (RS34).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlcStatus {
    /// Run/stop character as received.
    pub run_state: char,
    /// Preset-changed flag character as received.
    pub preset_changed: char,
    /// Protection mode character as received.
    pub protection: char,
    /// CPU module type code character as received.
    pub cpu_code: char,
    /// Bytes after the four fixed positions, if any.
    pub extra: String,
}

impl PlcStatus {
    /// Decodes an RS34 reply data field.
    ///
    /// # Errors
    ///
    /// Returns [`MaintError::UnexpectedReply`] if the field is shorter than
    /// [`STATUS_MIN_LEN`] characters.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < STATUS_MIN_LEN {
            return Err(MaintError::unexpected_reply(format!(
                "status reply too short: expected at least {STATUS_MIN_LEN} bytes, got {}",
                data.len()
            )));
        }
        // Fields are positional bytes, not UTF-8 text; a stray multi-byte
        // sequence must not shift or swallow them.
        Ok(Self {
            run_state: data[0] as char,
            preset_changed: data[1] as char,
            protection: data[2] as char,
            cpu_code: data[3] as char,
            extra: String::from_utf8_lossy(&data[STATUS_MIN_LEN..]).into_owned(),
        })
    }

    /// Returns whether the PLC is running.
    pub fn is_running(&self) -> bool {
        self.run_state == '0'
    }

    /// Returns whether a timer/counter preset was changed since download.
    pub fn preset_changed(&self) -> bool {
        self.preset_changed == '1'
    }

    /// Human-readable run/stop state.
    pub fn run_description(&self) -> &'static str {
        match self.run_state {
            '0' => "Run",
            '1' => "Stop",
            _ => "Unknown",
        }
    }

    /// Human-readable user-program protection mode.
    pub fn protection_description(&self) -> &'static str {
        match self.protection {
            '0' => "Not protected",
            '1' => "Write protect",
            '2' => "Read protect",
            '3' => "Read + write protect",
            _ => "Unknown",
        }
    }

    /// Human-readable CPU module type.
    pub fn cpu_description(&self) -> &'static str {
        match self.cpu_code {
            '0' => "10-I/O",
            '1' => "16-I/O",
            '2' => "20-I/O transistor output",
            '3' => "24-I/O",
            '4' => "40-I/O",
            '6' => "20-I/O relay output",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for PlcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, presets {}, {}, CPU {}",
            self.run_description(),
            if self.preset_changed() {
                "changed"
            } else {
                "unchanged"
            },
            self.protection_description(),
            self.cpu_description()
        )
    }
}
