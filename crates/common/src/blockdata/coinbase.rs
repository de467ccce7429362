//! Block height embedded in the coinbase transaction (BIP34).
//!
//! Since BIP34 the unlocking script of the coinbase input starts with a push
//! of the block height. The extractor reads the three bytes after the push
//! opcode as a little-endian integer, which covers every height a 3-byte push
//! can express.

use thiserror::Error;

use crate::blockdata::transaction::BlockTransaction;

/// Minimum script length: one push opcode plus three height bytes.
const MIN_SCRIPT_LEN: usize = 4;

/// Reasons a coinbase does not yield a height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HeightError {
    /// No transaction has been decoded, so there is no coinbase to read.
    #[error("Block has no coinbase transaction")]
    NoCoinbase,

    /// The coinbase transaction has no inputs.
    #[error("Coinbase transaction has no inputs")]
    NoInputs,

    /// The coinbase unlocking script is too short to hold a height.
    #[error("Coinbase script is {length} bytes, need at least 4")]
    ScriptTooShort {
        /// Length of the unlocking script.
        length: usize,
    },
}

/// Reads the block height from a coinbase transaction.
///
/// Script bytes `1..=3` are interpreted as a little-endian integer; the
/// leading push opcode is skipped without being checked.
///
/// # Errors
///
/// * `HeightError::NoInputs` - If the coinbase has no inputs
/// * `HeightError::ScriptTooShort` - If the unlocking script is shorter than
///   4 bytes
pub fn extract_height<T: BlockTransaction>(coinbase: &T) -> Result<u32, HeightError> {
    let script = coinbase.first_input_script().ok_or(HeightError::NoInputs)?;

    match script.get(1..MIN_SCRIPT_LEN) {
        Some(&[low, mid, high]) => Ok(u32::from_le_bytes([low, mid, high, 0])),
        _ => Err(HeightError::ScriptTooShort {
            length: script.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Coinbase(Option<Vec<u8>>);

    impl BlockTransaction for Coinbase {
        fn first_input_script(&self) -> Option<&[u8]> {
            self.0.as_deref()
        }
    }

    #[test]
    fn test_extract_height() {
        let coinbase = Coinbase(Some(vec![0x03, 0x4a, 0x01, 0x02, 0xff, 0xee]));
        assert_eq!(extract_height(&coinbase), Ok(0x02014a));
        assert_eq!(extract_height(&coinbase), Ok(131_402));
    }

    #[test]
    fn test_exactly_four_bytes() {
        let coinbase = Coinbase(Some(vec![0x03, 0x01, 0x00, 0x00]));
        assert_eq!(extract_height(&coinbase), Ok(1));
    }

    #[test]
    fn test_short_script() {
        let coinbase = Coinbase(Some(vec![0x02, 0x01, 0x00]));
        assert_eq!(
            extract_height(&coinbase),
            Err(HeightError::ScriptTooShort { length: 3 })
        );

        let coinbase = Coinbase(Some(Vec::new()));
        assert_eq!(
            extract_height(&coinbase),
            Err(HeightError::ScriptTooShort { length: 0 })
        );
    }

    #[test]
    fn test_no_inputs() {
        assert_eq!(extract_height(&Coinbase(None)), Err(HeightError::NoInputs));
    }
}
