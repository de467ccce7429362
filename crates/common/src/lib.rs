//! Raw block decoding library.
//!
//! This library decodes wire-format blocks into a structured representation:
//! the 80-byte header with every field in canonical byte order, the block
//! hash, the proof-of-work target and difficulty derived from the compact
//! bits, the transactions (decoded eagerly or on demand), and the block
//! height embedded in the coinbase.

#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::cast_sign_loss))]
#![cfg_attr(test, allow(clippy::indexing_slicing))]
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation))]

/// Block data structures: header, transaction stream, coinbase height.
pub mod blockdata;
/// Consensus encoding and decoding functionality.
pub mod consensus;
/// Error types shared across the decoder.
pub mod error;
/// Hash functions and types.
pub mod hashes;
/// Network types.
pub mod network;
/// Proof of Work related functionality.
pub mod pow;
/// Various utility functions and types.
pub mod util;

pub use blockdata::block::{Block, BlockHeader, BlockSummary, DecodeOptions};
pub use error::{DecodeError, DecodeResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
