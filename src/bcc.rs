//! Block Check Character (BCC) computation and ASCII-hex helpers.
//!
//! Every frame on the wire ends in a 2-character uppercase hex rendering of
//! the XOR of a byte span. Which bytes the span covers differs between
//! requests (mode-dependent, see [`BccMode`](crate::BccMode)) and replies
//! (always from the control byte up to the checksum digits).

/// Computes the XOR block-check character over a byte span.
///
/// Deterministic, no side effects, always in `0..=255`.
///
/// # Example
///
/// ```
/// use idec_maint::bcc::xor_bcc;
///
/// assert_eq!(xor_bcc(b""), 0x00);
/// assert_eq!(xor_bcc(b"\x05FF0RD010002"), xor_bcc(b"\x05FF0RD010002"));
/// ```
pub fn xor_bcc(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Renders a byte as two uppercase ASCII hex characters.
pub fn to_hex_ascii(value: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    [
        DIGITS[(value >> 4) as usize],
        DIGITS[(value & 0x0F) as usize],
    ]
}

/// Parses two ASCII hex characters into a byte value.
///
/// Returns `None` unless both characters are `'0'..='9'` or `'A'..='F'`.
pub fn hex_pair_value(pair: &[u8]) -> Option<u8> {
    if pair.len() != 2 || !is_hex_ascii(pair) {
        return None;
    }
    let digit = |c: u8| -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            _ => c - b'A' + 10,
        }
    };
    Some((digit(pair[0]) << 4) | digit(pair[1]))
}

/// Returns whether every byte is an uppercase ASCII hex digit.
///
/// The protocol only ever emits `'0'..='9'` and `'A'..='F'`; lowercase hex
/// in a reply is treated as invalid.
pub fn is_hex_ascii(data: &[u8]) -> bool {
    data.iter()
        .all(|&c| c.is_ascii_digit() || (b'A'..=b'F').contains(&c))
}

/// Parses a 4-character ASCII hex field into a 16-bit word.
///
/// Returns `None` if the field is not exactly 4 valid hex characters.
pub fn hex_word(field: &[u8]) -> Option<u16> {
    if field.len() != 4 || !is_hex_ascii(field) {
        return None;
    }
    let hi = hex_pair_value(&field[0..2])? as u16;
    let lo = hex_pair_value(&field[2..4])? as u16;
    Some((hi << 8) | lo)
}
