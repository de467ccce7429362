//! Error types for block decoding.
//!
//! Header-stage failures ([`DecodeError::TruncatedInput`],
//! [`DecodeError::HashMismatch`]) never produce a partial block. A failing
//! transaction is reported with its position in the block, and
//! [`DecodeError::HeightExtraction`] is only surfaced when the height is
//! requested explicitly.

use thiserror::Error;

use crate::{blockdata::coinbase::HeightError, hashes::Hash256, pow::ArithmeticError};

/// Boxed error produced by a transaction decoder.
pub type TransactionSourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Block decoding error types.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer is shorter than a field or length prefix demands.
    #[error("Truncated input: needed {needed} bytes, only {available} available")]
    TruncatedInput {
        /// Number of bytes the field required, counted from the start of the
        /// buffer being read.
        needed: usize,
        /// Number of bytes actually present.
        available: usize,
    },

    /// The caller-supplied hash does not match the hash of the header bytes.
    ///
    /// This usually means the wrong block was fetched or the bytes were
    /// corrupted in transit.
    #[error("Block hash mismatch: expected {expected}, calculated {calculated}")]
    HashMismatch {
        /// Hash supplied by the caller.
        expected: Hash256,
        /// Reversed double SHA-256 of the 80 header bytes.
        calculated: Hash256,
    },

    /// The transaction at `index` could not be decoded.
    ///
    /// Transactions before `index` were decoded successfully and are left
    /// untouched.
    #[error("Failed to decode transaction {index}: {source}")]
    TransactionDecode {
        /// Position of the failing transaction in the block (0 = coinbase).
        index: usize,
        /// Error reported by the transaction decoder.
        source: TransactionSourceError,
    },

    /// The coinbase does not carry a usable height.
    #[error("Height extraction failed: {0}")]
    HeightExtraction(#[from] HeightError),

    /// Target or difficulty could not be derived from the compact bits.
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Result type for block decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
