//! The fixed 80-byte block header.
//!
//! Every multi-byte field is serialized in reversed (little-endian) order.
//! [`BlockHeader`] stores each field once, reversed into canonical
//! (big-endian/display) order, and derives the integer forms on demand.
//!
//! | Offset | Length | Field               |
//! |--------|--------|---------------------|
//! | 0      | 4      | version             |
//! | 4      | 32     | previous block hash |
//! | 36     | 32     | merkle root         |
//! | 68     | 4      | timestamp           |
//! | 72     | 4      | bits                |
//! | 76     | 4      | nonce               |

use bitcoin::{
    BlockHash as BitcoinBlockHash, CompactTarget, TxMerkleNode,
    block::{Header as InnerHeader, Version},
};

use crate::{
    error::{DecodeError, DecodeResult},
    hashes::{Hash, Hash256, hash2},
    pow::{CompactBits, Target},
    util::{read_array, reversed},
};

const VERSION_OFFSET: usize = 0;
const PREVIOUS_BLOCK_HASH_OFFSET: usize = 4;
const MERKLE_ROOT_OFFSET: usize = 36;
const TIMESTAMP_OFFSET: usize = 68;
const BITS_OFFSET: usize = 72;
const NONCE_OFFSET: usize = 76;

/// A decoded block header with all fields in canonical byte order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockHeader {
    version: [u8; 4],
    previous_block_hash: Hash256,
    merkle_root: Hash256,
    timestamp: [u8; 4],
    bits: CompactBits,
    nonce: [u8; 4],
}

impl BlockHeader {
    /// The size of a serialized header in bytes.
    pub const SIZE: usize = 80;

    /// Creates a header from integer-valued fields.
    pub fn new(
        version: u32,
        previous_block_hash: Hash256,
        merkle_root: Hash256,
        timestamp: u32,
        bits: CompactBits,
        nonce: u32,
    ) -> Self {
        BlockHeader {
            version: version.to_be_bytes(),
            previous_block_hash,
            merkle_root,
            timestamp: timestamp.to_be_bytes(),
            bits,
            nonce: nonce.to_be_bytes(),
        }
    }

    /// Decodes the header from the first 80 bytes of `raw`.
    ///
    /// Bytes past the header are ignored.
    ///
    /// # Errors
    ///
    /// * `DecodeError::TruncatedInput` - If `raw` holds fewer than 80 bytes
    pub fn from_wire_bytes(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < Self::SIZE {
            return Err(DecodeError::TruncatedInput {
                needed: Self::SIZE,
                available: raw.len(),
            });
        }

        Ok(BlockHeader {
            version: reversed(&read_array(raw, VERSION_OFFSET)?),
            previous_block_hash: Hash256::from_wire_bytes(read_array(
                raw,
                PREVIOUS_BLOCK_HASH_OFFSET,
            )?),
            merkle_root: Hash256::from_wire_bytes(read_array(raw, MERKLE_ROOT_OFFSET)?),
            timestamp: reversed(&read_array(raw, TIMESTAMP_OFFSET)?),
            bits: CompactBits::from_wire_bytes(read_array(raw, BITS_OFFSET)?),
            nonce: reversed(&read_array(raw, NONCE_OFFSET)?),
        })
    }

    /// Serializes the header back into its 80 wire bytes.
    pub fn to_wire_bytes(&self) -> [u8; 80] {
        let mut raw = [0u8; Self::SIZE];
        let fields: [(usize, &[u8]); 6] = [
            (VERSION_OFFSET, &reversed(&self.version)),
            (PREVIOUS_BLOCK_HASH_OFFSET, &self.previous_block_hash.to_wire_bytes()),
            (MERKLE_ROOT_OFFSET, &self.merkle_root.to_wire_bytes()),
            (TIMESTAMP_OFFSET, &reversed(&self.timestamp)),
            (BITS_OFFSET, &self.bits.to_wire_bytes()),
            (NONCE_OFFSET, &reversed(&self.nonce)),
        ];
        for (offset, bytes) in fields {
            raw.iter_mut()
                .skip(offset)
                .zip(bytes)
                .for_each(|(dst, src)| *dst = *src);
        }
        raw
    }

    /// Computes the block hash: double SHA-256 of the wire bytes, reversed.
    pub fn block_hash(&self) -> Hash256 {
        Hash256::from_wire_bytes(hash2(&self.to_wire_bytes()))
    }

    /// The version field in canonical byte order.
    pub fn version_bytes(&self) -> [u8; 4] {
        self.version
    }

    /// The version as an unsigned integer.
    pub fn version(&self) -> u32 {
        u32::from_be_bytes(self.version)
    }

    /// Hash of the previous block.
    pub fn previous_block_hash(&self) -> Hash256 {
        self.previous_block_hash
    }

    /// Merkle root of the block's transactions.
    pub fn merkle_root(&self) -> Hash256 {
        self.merkle_root
    }

    /// The timestamp field in canonical byte order.
    pub fn timestamp_bytes(&self) -> [u8; 4] {
        self.timestamp
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes(self.timestamp)
    }

    /// The compact difficulty bits.
    pub fn bits(&self) -> CompactBits {
        self.bits
    }

    /// The nonce field in canonical byte order.
    pub fn nonce_bytes(&self) -> [u8; 4] {
        self.nonce
    }

    /// The nonce as an unsigned integer.
    pub fn nonce(&self) -> u32 {
        u32::from_be_bytes(self.nonce)
    }

    /// Expands the compact bits into the full target.
    pub fn target(&self) -> DecodeResult<Target> {
        Ok(Target::from_compact(self.bits)?)
    }

    /// Converts to the `bitcoin` crate's header type.
    pub fn to_bitcoin_header(&self) -> InnerHeader {
        InnerHeader {
            version: Version::from_consensus(i32::from_be_bytes(self.version)),
            prev_blockhash: BitcoinBlockHash::from_byte_array(
                self.previous_block_hash.to_wire_bytes(),
            ),
            merkle_root: TxMerkleNode::from_byte_array(self.merkle_root.to_wire_bytes()),
            time: self.timestamp(),
            bits: CompactTarget::from_consensus(self.bits.to_consensus()),
            nonce: self.nonce(),
        }
    }
}

impl From<InnerHeader> for BlockHeader {
    fn from(header: InnerHeader) -> Self {
        BlockHeader {
            version: header.version.to_consensus().to_be_bytes(),
            previous_block_hash: Hash256::from_wire_bytes(header.prev_blockhash.to_byte_array()),
            merkle_root: Hash256::from_wire_bytes(header.merkle_root.to_byte_array()),
            timestamp: header.time.to_be_bytes(),
            bits: CompactBits::from_consensus(header.bits.to_consensus()),
            nonce: header.nonce.to_be_bytes(),
        }
    }
}
