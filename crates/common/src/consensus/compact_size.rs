//! Compact-size ("varint") length prefixes.
//!
//! | First byte | Value                         | Bytes consumed |
//! |------------|-------------------------------|----------------|
//! | `< 0xfd`   | the byte itself               | 1              |
//! | `0xfd`     | next 2 bytes, little-endian   | 3              |
//! | `0xfe`     | next 4 bytes, little-endian   | 5              |
//! | `0xff`     | next 8 bytes, little-endian   | 9              |
//!
//! Non-minimal encodings (e.g. `0xfd 0x05 0x00`) are accepted.

use crate::{
    error::{DecodeError, DecodeResult},
    util::read_array,
};

/// Decodes a compact-size integer from the front of `bytes`.
///
/// Returns the value and the number of bytes the prefix occupied.
///
/// # Errors
///
/// * `DecodeError::TruncatedInput` - If `bytes` is empty or ends before the
///   width announced by the first byte
pub fn read_compact_size(bytes: &[u8]) -> DecodeResult<(u64, usize)> {
    let first = *bytes.first().ok_or(DecodeError::TruncatedInput {
        needed: 1,
        available: 0,
    })?;

    match first {
        0xfd => Ok((u64::from(u16::from_le_bytes(read_array(bytes, 1)?)), 3)),
        0xfe => Ok((u64::from(u32::from_le_bytes(read_array(bytes, 1)?)), 5)),
        0xff => Ok((u64::from_le_bytes(read_array(bytes, 1)?), 9)),
        value => Ok((u64::from(value), 1)),
    }
}
