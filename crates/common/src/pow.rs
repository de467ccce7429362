//! Proof-of-work target and difficulty.
//!
//! This module defines [`CompactBits`], the 4-byte "bits" field of a block
//! header, and [`Target`], the 256-bit threshold it encodes. Neither type
//! checks a block hash against the target; they only derive the numbers the
//! header commits to.
//!
//! The compact format stores a 1-byte exponent `e` followed by a 3-byte
//! coefficient `c`:
//!
//! ```text
//! target = c * 256^(e - 3)
//! ```
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{reversed, to_hex};

/// Reported difficulty for blocks whose computed ratio falls below this
/// value.
///
/// Early blocks compute to a ratio around 1, and the reference client reports
/// `0xffff001d` for them. The floor is kept exactly as observed and is not a
/// general clamp: any ratio at or above it is returned unchanged.
pub const DIFFICULTY_FLOOR: f64 = 4_294_901_789.0; // 0xffff001d

/// 2^64 as a float, used to fold `U256` limbs.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Errors that can occur while deriving target or difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// The coefficient is zero, so there is no target to divide by.
    #[error("Target is zero")]
    ZeroTarget,

    /// `c * 256^(e - 3)` does not fit in 256 bits.
    #[error("Target with exponent {exponent:#04x} does not fit in 256 bits")]
    TargetOverflow {
        /// The exponent byte of the compact bits.
        exponent: u8,
    },
}

/// The compact "bits" field of a block header in canonical (big-endian)
/// order.
///
/// Only the canonical bytes are stored; the integer form is derived on
/// demand so the two can never disagree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompactBits([u8; 4]);

impl CompactBits {
    /// Bits of the easiest target, as found in the genesis block.
    pub const MAX_TARGET_BITS: CompactBits = CompactBits([0x1d, 0x00, 0xff, 0xff]);

    /// Creates compact bits from their integer value, e.g. `0x1d00ffff`.
    pub const fn from_consensus(bits: u32) -> Self {
        CompactBits(bits.to_be_bytes())
    }

    /// Creates compact bits from canonical (big-endian) bytes.
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        CompactBits(bytes)
    }

    /// Creates compact bits from the 4 bytes found in a serialized header.
    pub fn from_wire_bytes(bytes: [u8; 4]) -> Self {
        CompactBits(reversed(&bytes))
    }

    /// Returns the integer value, e.g. `0x1d00ffff`.
    pub const fn to_consensus(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Returns the canonical (big-endian) bytes.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Returns the bytes as they appear in a serialized header.
    pub fn to_wire_bytes(self) -> [u8; 4] {
        reversed(&self.0)
    }

    /// The exponent byte `e`.
    pub const fn exponent(self) -> u8 {
        self.0[0]
    }

    /// The 24-bit coefficient `c`, zero-extended.
    pub const fn coefficient(self) -> u32 {
        u32::from_be_bytes([0, self.0[1], self.0[2], self.0[3]])
    }
}

impl From<u32> for CompactBits {
    fn from(bits: u32) -> Self {
        CompactBits::from_consensus(bits)
    }
}

/// Represents a target value expressed as an unsigned 256-bit integer.
///
/// # Example
///
/// ```
/// use rawblock_common::pow::{CompactBits, Target};
///
/// let target = Target::from_compact(CompactBits::from_consensus(0x1d00ffff))?;
/// assert_eq!(
///     target.to_hex(),
///     "00000000ffff0000000000000000000000000000000000000000000000000000"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(U256);

impl Target {
    /// The easiest target, `0xffff * 256^(0x1d - 3)`.
    ///
    /// Difficulty is measured relative to this value.
    pub const MAX: Target = Target(U256([0, 0, 0, 0xffff_0000]));

    /// Creates a Target from bytes (big-endian).
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Target(U256::from_big_endian(bytes))
    }

    /// Expands compact bits into a full 256-bit target.
    ///
    /// Exponents below 3 shift the coefficient right, discarding the low
    /// bytes. A zero coefficient yields a zero target; that is only rejected
    /// once a difficulty is requested.
    ///
    /// # Errors
    ///
    /// * `ArithmeticError::TargetOverflow` - If the result needs more than 256
    ///   bits
    pub fn from_compact(bits: CompactBits) -> Result<Self, ArithmeticError> {
        let exponent = u32::from(bits.exponent());
        let coefficient = U256::from(bits.coefficient());

        if exponent < 3 {
            let shift = 3u32.saturating_sub(exponent).saturating_mul(8);
            return Ok(Target(coefficient >> shift));
        }

        let shift = exponent.saturating_sub(3).saturating_mul(8);
        let coefficient_bits = u32::try_from(coefficient.bits()).unwrap_or(u32::MAX);
        if coefficient_bits.saturating_add(shift) > 256 {
            return Err(ArithmeticError::TargetOverflow {
                exponent: bits.exponent(),
            });
        }

        Ok(Target(coefficient << shift))
    }

    /// Returns the big-endian bytes of the target.
    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        bytes
    }

    /// The target as exactly 64 lowercase hex digits, zero-padded on the left.
    pub fn to_hex(self) -> String {
        to_hex(self.to_be_bytes())
    }

    /// Returns true if the target is zero.
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Approximates the target as a float.
    pub fn to_f64(self) -> f64 {
        // U256 limbs are little-endian
        self.0
            .0
            .iter()
            .rev()
            .fold(0.0, |acc, &limb| acc * TWO_POW_64 + limb as f64)
    }

    /// Returns `Target::MAX / self` as a float, without any floor.
    ///
    /// The easiest target yields exactly `1.0`.
    ///
    /// # Errors
    ///
    /// * `ArithmeticError::ZeroTarget` - If the target is zero
    pub fn difficulty_ratio(self) -> Result<f64, ArithmeticError> {
        if self.is_zero() {
            return Err(ArithmeticError::ZeroTarget);
        }
        Ok(Target::MAX.to_f64() / self.to_f64())
    }

    /// Returns the difficulty as reported for a block with this target.
    ///
    /// This is [`Target::difficulty_ratio`], except that ratios below
    /// [`DIFFICULTY_FLOOR`] are reported as the floor itself.
    ///
    /// # Errors
    ///
    /// * `ArithmeticError::ZeroTarget` - If the target is zero
    pub fn difficulty(self) -> Result<f64, ArithmeticError> {
        let ratio = self.difficulty_ratio()?;
        if ratio < DIFFICULTY_FLOOR {
            Ok(DIFFICULTY_FLOOR)
        } else {
            Ok(ratio)
        }
    }
}

impl TryFrom<CompactBits> for Target {
    type Error = ArithmeticError;

    fn try_from(bits: CompactBits) -> Result<Self, Self::Error> {
        Target::from_compact(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_TARGET_HEX: &str =
        "00000000ffff0000000000000000000000000000000000000000000000000000";

    #[test]
    fn test_compact_bits_fields() {
        let bits = CompactBits::from_consensus(0x1d00ffff);
        assert_eq!(bits.exponent(), 0x1d);
        assert_eq!(bits.coefficient(), 0x00ffff);
        assert_eq!(bits.to_be_bytes(), [0x1d, 0x00, 0xff, 0xff]);
        assert_eq!(bits.to_wire_bytes(), [0xff, 0xff, 0x00, 0x1d]);
        assert_eq!(CompactBits::from_wire_bytes([0xff, 0xff, 0x00, 0x1d]), bits);
        assert_eq!(bits, CompactBits::MAX_TARGET_BITS);
    }

    #[test]
    fn test_genesis_target() {
        let target = Target::from_compact(CompactBits::MAX_TARGET_BITS).unwrap();
        assert_eq!(target, Target::MAX);
        assert_eq!(target.to_hex(), GENESIS_TARGET_HEX);
        assert_eq!(target.to_hex().len(), 64);
    }

    #[test]
    fn test_genesis_difficulty_hits_floor() {
        let target = Target::from_compact(CompactBits::MAX_TARGET_BITS).unwrap();
        assert_eq!(target.difficulty_ratio().unwrap(), 1.0);
        assert_eq!(target.difficulty().unwrap(), DIFFICULTY_FLOOR);
        assert_eq!(DIFFICULTY_FLOOR, f64::from(0xffff001du32));
    }

    #[test]
    fn test_difficulty_below_floor_reports_floor() {
        // Block 100000
        let target = Target::from_compact(CompactBits::from_consensus(0x1b04864c)).unwrap();
        let ratio = target.difficulty_ratio().unwrap();
        assert!(ratio > 14484.16 && ratio < 14484.17, "ratio was {ratio}");
        assert_eq!(target.difficulty().unwrap(), DIFFICULTY_FLOOR);
    }

    #[test]
    fn test_difficulty_above_floor_is_unchanged() {
        // 0xffff * 256^20: the ratio is exactly 256^6
        let target = Target::from_compact(CompactBits::from_consensus(0x1700ffff)).unwrap();
        assert_eq!(target.difficulty().unwrap(), 281_474_976_710_656.0);
    }

    #[test]
    fn test_small_exponent_shifts_right() {
        let target = Target::from_compact(CompactBits::from_consensus(0x03123456)).unwrap();
        assert_eq!(target.to_be_bytes()[29..], [0x12, 0x34, 0x56]);

        let target = Target::from_compact(CompactBits::from_consensus(0x02123456)).unwrap();
        assert_eq!(target.to_be_bytes()[30..], [0x12, 0x34]);

        let target = Target::from_compact(CompactBits::from_consensus(0x00123456)).unwrap();
        assert!(target.is_zero());
    }

    #[test]
    fn test_zero_coefficient() {
        let target = Target::from_compact(CompactBits::from_consensus(0x1d000000)).unwrap();
        assert!(target.is_zero());
        assert_eq!(target.to_hex(), "0".repeat(64));
        assert_eq!(target.difficulty(), Err(ArithmeticError::ZeroTarget));
    }

    #[test]
    fn test_overflowing_exponent() {
        // 0xffffff * 256^29 needs 256 bits exactly
        assert!(Target::from_compact(CompactBits::from_consensus(0x20ffffff)).is_ok());
        assert_eq!(
            Target::from_compact(CompactBits::from_consensus(0x21ffffff)),
            Err(ArithmeticError::TargetOverflow { exponent: 0x21 })
        );
        // A small coefficient still fits one exponent higher
        assert!(Target::from_compact(CompactBits::from_consensus(0x21000001)).is_ok());
    }

    #[test]
    fn test_agrees_with_bitcoin_target() {
        for bits in [0x1d00ffffu32, 0x1b04864c, 0x1a05db8b, 0x17034219, 0x207fffff] {
            let ours = Target::from_compact(CompactBits::from_consensus(bits)).unwrap();
            let theirs = bitcoin::Target::from_compact(bitcoin::CompactTarget::from_consensus(bits));
            assert_eq!(ours.to_be_bytes(), theirs.to_be_bytes(), "bits {bits:#010x}");
        }
    }
}
