//! Operand addressing for the maintenance protocol.
//!
//! An operand is a data-type letter plus a numeric index in `0..=9999`,
//! written like `"D0100"` or `"M8070"`. The bit-addressable classes
//! (X/Y/M/R) use a lowercase letter on the wire; everything else keeps its
//! letter as given. The simplified enumerable I/O aliases `Q`/`I` map onto
//! the `Y` (output) and `X` (input) bit classes.

use crate::error::{MaintError, Result};

/// Largest operand number addressable by the protocol.
pub const MAX_OPERAND: u16 = 9999;

/// Coarse operand classification derived from the data-type letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandClass {
    /// Bit-addressable relay classes: X, Y, M, R.
    Bit,
    /// Word-oriented classes: D, W, C, T and any other registered letter.
    Word,
}

/// Direction of a simplified enumerable I/O alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    /// Physical input (I / X addresses).
    Input,
    /// Physical output (Q / Y addresses).
    Output,
}

/// A validated operand address: data-type letter plus operand number.
///
/// # Example
///
/// ```
/// use idec_maint::{Operand, OperandClass};
///
/// let d100 = Operand::parse("D0100").unwrap();
/// assert_eq!((d100.dtype, d100.number), ('D', 100));
/// assert_eq!(d100.class(), OperandClass::Word);
///
/// let m8070 = Operand::parse("M8070").unwrap();
/// assert_eq!((m8070.dtype, m8070.number), ('M', 8070));
/// assert_eq!(m8070.class(), OperandClass::Bit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    /// Data-type letter selecting the operand class.
    pub dtype: char,
    /// Operand number, `0..=9999`.
    pub number: u16,
}

impl Operand {
    /// Creates an operand from an explicit data-type letter and number.
    ///
    /// # Errors
    ///
    /// Returns [`MaintError::InvalidAddress`] if the letter is not a single
    /// ASCII alphabetic character or the number exceeds [`MAX_OPERAND`].
    pub fn new(dtype: char, number: u16) -> Result<Self> {
        if !dtype.is_ascii_alphabetic() {
            return Err(MaintError::invalid_address(format!(
                "data-type letter must be ASCII alphabetic, got {dtype:?}"
            )));
        }
        if number > MAX_OPERAND {
            return Err(MaintError::invalid_address(format!(
                "operand number must be 0..={MAX_OPERAND}, got {number}"
            )));
        }
        Ok(Self { dtype, number })
    }

    /// Parses a textual address like `"D0100"` or `"M8070"`.
    ///
    /// The first character is the data-type letter; the remainder must be
    /// all decimal digits.
    ///
    /// # Errors
    ///
    /// Returns [`MaintError::InvalidAddress`] if the token is shorter than
    /// 2 characters, the numeric portion contains a non-digit, or the
    /// operand is out of range.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.len() < 2 {
            return Err(MaintError::invalid_address(format!(
                "address must look like \"D0100\" or \"M8070\", got {token:?}"
            )));
        }
        let mut chars = token.chars();
        let dtype = chars.next().expect("token has at least 2 chars");
        let digits = chars.as_str();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MaintError::invalid_address(format!(
                "numeric portion of {token:?} must be all digits"
            )));
        }
        let number: u16 = digits.parse().map_err(|_| {
            MaintError::invalid_address(format!("operand number in {token:?} is out of range"))
        })?;
        Self::new(dtype, number)
    }

    /// Classifies the operand by its data-type letter.
    pub fn class(self) -> OperandClass {
        match self.dtype.to_ascii_uppercase() {
            'X' | 'Y' | 'M' | 'R' => OperandClass::Bit,
            _ => OperandClass::Word,
        }
    }

    /// Returns the lowercase wire letter for a bit-class operand.
    ///
    /// # Errors
    ///
    /// Returns [`MaintError::InvalidAddress`] for any letter outside the
    /// four bit classes X/Y/M/R.
    pub fn bit_letter(self) -> Result<char> {
        match self.class() {
            OperandClass::Bit => Ok(self.dtype.to_ascii_lowercase()),
            OperandClass::Word => Err(MaintError::invalid_address(format!(
                "bit operand letter must be X/Y/M/R, got {:?}",
                self.dtype
            ))),
        }
    }

    /// Renders the operand number as the 4-digit decimal wire field.
    pub fn padded(self) -> String {
        pad4(self.number).expect("operand number validated on construction")
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:04}", self.dtype, self.number)
    }
}

/// Pads an operand number to the 4-digit decimal wire field.
///
/// # Errors
///
/// Returns [`MaintError::InvalidAddress`] if the number exceeds
/// [`MAX_OPERAND`].
pub fn pad4(number: u16) -> Result<String> {
    if number > MAX_OPERAND {
        return Err(MaintError::invalid_address(format!(
            "operand number must be 0..={MAX_OPERAND}, got {number}"
        )));
    }
    Ok(format!("{number:04}"))
}

/// Resolves a textual enumerable I/O alias to its bit operand.
///
/// Accepts `Q`/`Y` prefixes for outputs and `I`/`X` prefixes for inputs,
/// followed by decimal digits (`"Q7"`, `"I0"`, `"Y0007"`, `"X0007"`).
/// A prefix that does not match the requested direction is rejected.
///
/// # Errors
///
/// Returns [`MaintError::InvalidAddress`] on an empty token, a prefix/
/// direction mismatch, a non-digit tail, or an out-of-range index.
pub fn simple_io(token: &str, dir: IoDirection) -> Result<Operand> {
    let token = token.trim().to_ascii_uppercase();
    let mut chars = token.chars();
    let head = chars.next().ok_or_else(|| {
        MaintError::invalid_address("empty I/O address")
    })?;
    let tail = chars.as_str();

    let head_dir = match head {
        'Q' | 'Y' => IoDirection::Output,
        'I' | 'X' => IoDirection::Input,
        _ => {
            return Err(MaintError::invalid_address(format!(
                "I/O address must start with Q/I or Y/X, got {token:?}"
            )))
        }
    };
    if head_dir != dir {
        return Err(MaintError::invalid_address(format!(
            "{token:?} does not match the requested I/O direction"
        )));
    }
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MaintError::invalid_address(format!(
            "I/O address tail must be decimal digits, got {token:?}"
        )));
    }
    let index: u16 = tail.parse().map_err(|_| {
        MaintError::invalid_address(format!("I/O index in {token:?} is out of range"))
    })?;
    simple_io_index(index, dir)
}

/// Resolves a bare I/O index to its bit operand (`Y` for outputs, `X` for
/// inputs).
///
/// # Errors
///
/// Returns [`MaintError::InvalidAddress`] if the index exceeds
/// [`MAX_OPERAND`].
pub fn simple_io_index(index: u16, dir: IoDirection) -> Result<Operand> {
    let dtype = match dir {
        IoDirection::Output => 'Y',
        IoDirection::Input => 'X',
    };
    Operand::new(dtype, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word_address() {
        let op = Operand::parse("D0100").unwrap();
        assert_eq!(op.dtype, 'D');
        assert_eq!(op.number, 100);
        assert_eq!(op.class(), OperandClass::Word);
    }

    #[test]
    fn test_parse_bit_address() {
        let op = Operand::parse("M8070").unwrap();
        assert_eq!(op.dtype, 'M');
        assert_eq!(op.number, 8070);
        assert_eq!(op.class(), OperandClass::Bit);
        assert_eq!(op.bit_letter().unwrap(), 'm');
    }

    #[test]
    fn test_parse_rejects_non_digit_portion() {
        assert!(matches!(
            Operand::parse("D1A0"),
            Err(MaintError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_short_token() {
        assert!(Operand::parse("D").is_err());
        assert!(Operand::parse("").is_err());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Operand::new('D', 10_000).is_err());
        assert!(Operand::new('D', MAX_OPERAND).is_ok());
    }

    #[test]
    fn test_bit_letter_rejects_word_class() {
        let op = Operand::new('D', 0).unwrap();
        assert!(matches!(
            op.bit_letter(),
            Err(MaintError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_pad4() {
        assert_eq!(pad4(0).unwrap(), "0000");
        assert_eq!(pad4(71).unwrap(), "0071");
        assert_eq!(pad4(9999).unwrap(), "9999");
    }

    #[test]
    fn test_simple_io_output_aliases() {
        for token in ["Q7", "Y7", "Y0007", "q7"] {
            let op = simple_io(token, IoDirection::Output).unwrap();
            assert_eq!((op.dtype, op.number), ('Y', 7));
        }
    }

    #[test]
    fn test_simple_io_input_aliases() {
        for token in ["I7", "X7", "X0007"] {
            let op = simple_io(token, IoDirection::Input).unwrap();
            assert_eq!((op.dtype, op.number), ('X', 7));
        }
    }

    #[test]
    fn test_simple_io_direction_mismatch() {
        assert!(simple_io("Q7", IoDirection::Input).is_err());
        assert!(simple_io("I7", IoDirection::Output).is_err());
        assert!(simple_io("X7", IoDirection::Output).is_err());
        assert!(simple_io("Y7", IoDirection::Input).is_err());
    }

    #[test]
    fn test_simple_io_rejects_garbage() {
        assert!(simple_io("", IoDirection::Output).is_err());
        assert!(simple_io("Z7", IoDirection::Output).is_err());
        assert!(simple_io("Q", IoDirection::Output).is_err());
        assert!(simple_io("Q7A", IoDirection::Output).is_err());
    }

    #[test]
    fn test_simple_io_index() {
        let out = simple_io_index(0, IoDirection::Output).unwrap();
        assert_eq!((out.dtype, out.number), ('Y', 0));
        let inp = simple_io_index(7, IoDirection::Input).unwrap();
        assert_eq!((inp.dtype, inp.number), ('X', 7));
    }

    #[test]
    fn test_display() {
        assert_eq!(Operand::parse("D0100").unwrap().to_string(), "D0100");
        assert_eq!(Operand::new('Y', 7).unwrap().to_string(), "Y0007");
    }
}
