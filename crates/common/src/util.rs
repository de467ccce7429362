use hex::FromHex;

use crate::{
    error::{DecodeError, DecodeResult},
    hashes::Hash256,
};

/// Returns a copy of `bytes` in reverse order.
pub fn reversed<const N: usize>(bytes: &[u8; N]) -> [u8; N] {
    let mut out = *bytes;
    out.reverse();
    out
}

/// Copies `N` bytes starting at `offset` out of `bytes`.
///
/// Fails with [`DecodeError::TruncatedInput`] when the buffer ends early.
pub fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> DecodeResult<[u8; N]> {
    let needed = offset.saturating_add(N);
    bytes
        .get(offset..needed)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(DecodeError::TruncatedInput {
            needed,
            available: bytes.len(),
        })
}

/// Lowercase hex encoding of arbitrary bytes.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Convert a display-order hex string to a [`Hash256`].
pub fn hex_to_hash256(hex: &str) -> Result<Hash256, hex::FromHexError> {
    let bytes = <[u8; 32]>::from_hex(hex)?;
    Ok(Hash256::from_byte_array(bytes))
}
