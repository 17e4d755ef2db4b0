//! # Variable-Length Integer Encoding
//!
//! Continuation-bit varints for string length prefixes. Each byte carries 7
//! payload bits; a set high bit means "more bytes follow". Groups are ordered
//! most-significant first, so a sequential reader can decode without knowing
//! the encoded width in advance.
//!
//! ## Encoding Format
//!
//! | Value range           | Bytes | Layout                                  |
//! |-----------------------|-------|-----------------------------------------|
//! | 0 - 0x7F              | 1     | `[0vvvvvvv]`                            |
//! | 0x80 - 0x3FFF         | 2     | `[1vvvvvvv, 0vvvvvvv]`                  |
//! | 0x4000 - 0x1F_FFFF    | 3     | `[1vvvvvvv, 1vvvvvvv, 0vvvvvvv]`        |
//! | 0x20_0000 - 0xFFF_FFFF| 4     | four groups                             |
//! | up to u32::MAX        | 5     | five groups                             |
//!
//! ## Error Handling
//!
//! `decode_varint` reports through `eyre`:
//! - empty input: "empty buffer for varint decode"
//! - no terminating byte: "truncated varint"
//! - more than five groups: "varint overflows u32"

use eyre::{bail, ensure, Result};

/// Number of bytes `encode_varint` will write for `value`.
pub fn varint_len(value: u32) -> usize {
    let bits = 32 - value.leading_zeros();
    (bits as usize).div_ceil(7).max(1)
}

/// Append the encoding of `value` to `out`. Returns the number of bytes
/// written.
pub fn encode_varint(value: u32, out: &mut Vec<u8>) -> usize {
    let len = varint_len(value);
    for group in (0..len).rev() {
        let mut byte = ((value >> (7 * group)) & 0x7f) as u8;
        if group > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
    len
}

/// Decode one varint from the front of `bytes`. Returns the value and the
/// number of bytes consumed.
pub fn decode_varint(bytes: &[u8]) -> Result<(u32, usize)> {
    ensure!(!bytes.is_empty(), "empty buffer for varint decode");

    let mut acc: u64 = 0;
    for (consumed, &byte) in bytes.iter().enumerate() {
        ensure!(consumed < 5, "varint overflows u32");
        acc = (acc << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            ensure!(acc <= u64::from(u32::MAX), "varint overflows u32");
            return Ok((acc as u32, consumed + 1));
        }
    }
    bail!("truncated varint");
}
