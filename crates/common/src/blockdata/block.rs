mod header;
mod stream;
#[cfg(test)]
pub(crate) mod test_utils;

use std::fmt;

pub use header::BlockHeader;
use serde::{Deserialize, Serialize};
pub use stream::{ConsumedLengthError, TransactionStream};
use tracing::{debug, warn};

use crate::{
    blockdata::{
        coinbase::{HeightError, extract_height},
        transaction::{BitcoinTransactionDecoder, TransactionDecoder},
    },
    consensus::read_compact_size,
    error::{DecodeError, DecodeResult},
    hashes::{Hash256, hash2},
    network::Network,
    pow::Target,
};

/// Options for [`Block::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Hash the header must produce; decoding fails on a mismatch.
    pub expected_hash: Option<Hash256>,
    /// Decode every transaction up front. When false only the coinbase is
    /// decoded and the rest waits for [`Block::continue_parsing`].
    pub parse_all_transactions: bool,
    /// Network handed to the transaction decoder.
    pub network: Network,
    /// Known block height; skips reading it from the coinbase.
    pub height: Option<u32>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            expected_hash: None,
            parse_all_transactions: true,
            network: Network::default(),
            height: None,
        }
    }
}

impl DecodeOptions {
    /// Requires the header to hash to `hash`.
    pub fn with_expected_hash(mut self, hash: Hash256) -> Self {
        self.expected_hash = Some(hash);
        self
    }

    /// Sets whether all transactions are decoded up front.
    pub fn with_parse_all_transactions(mut self, parse_all: bool) -> Self {
        self.parse_all_transactions = parse_all;
        self
    }

    /// Sets the network handed to the transaction decoder.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Supplies the block height.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }
}

/// Represents a decoded block.
///
/// A `Block` contains:
/// - The header, with all fields in canonical byte order
/// - The block hash, checked against the header bytes when decoded
/// - The transactions decoded so far; the first one is the coinbase
/// - The bytes of transactions not decoded yet
/// - The block height, if supplied or found in the coinbase
///
/// Decoded transactions together with [`Block::pending_bytes`] always make up
/// exactly the bytes that followed the transaction count.
#[derive(Debug, Clone)]
pub struct Block<D: TransactionDecoder = BitcoinTransactionDecoder> {
    hash: Hash256,
    header: BlockHeader,
    declared_transaction_count: u64,
    stream: TransactionStream<D>,
    height: Option<u32>,
}

impl Block {
    /// Decodes a raw block using the consensus transaction decoder.
    ///
    /// See [`Block::decode_with`].
    pub fn decode(raw: &[u8], options: &DecodeOptions) -> DecodeResult<Self> {
        Self::decode_with(BitcoinTransactionDecoder, raw, options)
    }
}

impl<D: TransactionDecoder> Block<D> {
    /// Decodes a raw block, decoding transactions with `decoder`.
    ///
    /// The coinbase is always decoded; the remaining transactions are decoded
    /// now only if `options.parse_all_transactions` is set. When no height is
    /// supplied it is read from the coinbase; a coinbase without a usable
    /// height leaves the height unset rather than failing.
    ///
    /// # Errors
    ///
    /// * `DecodeError::TruncatedInput` - If `raw` is shorter than the header
    ///   plus the transaction count prefix
    /// * `DecodeError::HashMismatch` - If `options.expected_hash` differs from
    ///   the computed hash
    /// * `DecodeError::TransactionDecode` - If a transaction that was to be
    ///   decoded is malformed. No block is returned; decode lazily and call
    ///   [`Block::continue_parsing`] to keep the transactions before it.
    pub fn decode_with(decoder: D, raw: &[u8], options: &DecodeOptions) -> DecodeResult<Self> {
        let header = BlockHeader::from_wire_bytes(raw)?;
        let (header_bytes, rest) = raw.split_at_checked(BlockHeader::SIZE).ok_or(
            DecodeError::TruncatedInput {
                needed: BlockHeader::SIZE,
                available: raw.len(),
            },
        )?;

        let hash = Hash256::from_wire_bytes(hash2(header_bytes));
        if let Some(expected) = options.expected_hash {
            if expected != hash {
                return Err(DecodeError::HashMismatch {
                    expected,
                    calculated: hash,
                });
            }
        }

        let (declared_transaction_count, prefix_len) =
            read_compact_size(rest).map_err(|err| match err {
                DecodeError::TruncatedInput { needed, .. } => DecodeError::TruncatedInput {
                    needed: needed.saturating_add(BlockHeader::SIZE),
                    available: raw.len(),
                },
                other => other,
            })?;
        let payload = rest.get(prefix_len..).unwrap_or_default().to_vec();

        debug!(
            %hash,
            declared_transaction_count,
            payload_len = payload.len(),
            "Decoded block header"
        );

        let mut stream = TransactionStream::new(decoder, options.network, payload);
        // The coinbase is needed for the height, so it is decoded regardless
        // of the parsing mode
        stream.parse(1)?;
        if options.parse_all_transactions {
            stream.parse(0)?;
        }

        let mut block = Block {
            hash,
            header,
            declared_transaction_count,
            stream,
            height: options.height,
        };
        block.derive_height();

        let decoded = block.transaction_count() as u64;
        if block.is_fully_parsed() && decoded != declared_transaction_count {
            warn!(
                %hash,
                declared = declared_transaction_count,
                decoded,
                "Transaction count prefix disagrees with decoded transactions"
            );
        }

        Ok(block)
    }

    /// Builds a block from already-decoded parts.
    ///
    /// The hash is computed from `header`. When `height` is `None` it is read
    /// from the first transaction, if any.
    pub fn from_parts(
        header: BlockHeader,
        transactions: Vec<D::Transaction>,
        height: Option<u32>,
        network: Network,
        decoder: D,
    ) -> Self {
        let declared_transaction_count = transactions.len() as u64;
        let mut block = Block {
            hash: header.block_hash(),
            header,
            declared_transaction_count,
            stream: TransactionStream::from_transactions(decoder, network, transactions),
            height,
        };
        block.derive_height();
        block
    }

    /// Decodes up to `limit` more transactions; `0` decodes all that remain.
    ///
    /// Returns the number of transactions added, which is 0 once the block is
    /// fully parsed. Calls can be repeated to continue where the previous one
    /// stopped.
    ///
    /// # Errors
    ///
    /// * `DecodeError::TransactionDecode` - If a transaction is malformed.
    ///   Transactions decoded before it, including those from this call, are
    ///   kept, and the failing bytes stay pending.
    pub fn continue_parsing(&mut self, limit: usize) -> DecodeResult<usize> {
        let added = self.stream.parse(limit)?;
        if added > 0 {
            debug!(
                hash = %self.hash,
                added,
                total = self.transaction_count(),
                pending = self.pending_bytes().len(),
                "Decoded more transactions"
            );
            self.derive_height();
        }
        Ok(added)
    }

    /// Reads the height from the coinbase if none is known yet.
    fn derive_height(&mut self) {
        if self.height.is_some() || self.transactions().is_empty() {
            return;
        }
        match self.extract_height() {
            Ok(height) => self.height = Some(height),
            Err(err) => debug!(hash = %self.hash, %err, "No height in coinbase"),
        }
    }

    /// Reads the height embedded in the coinbase transaction.
    ///
    /// This ignores any height supplied at construction.
    ///
    /// # Errors
    ///
    /// * `DecodeError::HeightExtraction` - If there is no coinbase, it has no
    ///   inputs, or its unlocking script is too short
    pub fn extract_height(&self) -> DecodeResult<u32> {
        let coinbase = self.coinbase().ok_or(HeightError::NoCoinbase)?;
        Ok(extract_height(coinbase)?)
    }

    /// The block hash.
    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    /// The decoded header.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The block height, if supplied or read from the coinbase.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// The network handed to the transaction decoder.
    pub fn network(&self) -> Network {
        self.stream.network()
    }

    /// The transaction count written after the header.
    pub fn declared_transaction_count(&self) -> u64 {
        self.declared_transaction_count
    }

    /// Transactions decoded so far, in block order.
    pub fn transactions(&self) -> &[D::Transaction] {
        self.stream.transactions()
    }

    /// Number of transactions decoded so far.
    pub fn transaction_count(&self) -> usize {
        self.transactions().len()
    }

    /// The coinbase transaction, if decoded.
    pub fn coinbase(&self) -> Option<&D::Transaction> {
        self.transactions().first()
    }

    /// Bytes of transactions that have not been decoded yet.
    pub fn pending_bytes(&self) -> &[u8] {
        self.stream.pending_bytes()
    }

    /// Returns true when every transaction has been decoded.
    pub fn is_fully_parsed(&self) -> bool {
        self.stream.is_exhausted()
    }

    /// The proof-of-work target encoded in the header bits.
    pub fn target(&self) -> DecodeResult<Target> {
        self.header.target()
    }

    /// The target as 64 lowercase hex digits.
    pub fn target_hex(&self) -> DecodeResult<String> {
        Ok(self.target()?.to_hex())
    }

    /// The reported difficulty, see [`Target::difficulty`].
    pub fn difficulty(&self) -> DecodeResult<f64> {
        Ok(self.target()?.difficulty()?)
    }

    /// Projects the header fields and derived values into a flat summary.
    ///
    /// # Errors
    ///
    /// * `DecodeError::Arithmetic` - If the bits encode a zero target, or an
    ///   exponent so large the target does not fit in 256 bits
    ///   (`ArithmeticError::TargetOverflow`)
    pub fn summary(&self) -> DecodeResult<BlockSummary> {
        Ok(BlockSummary {
            hash: self.hash.to_hex(),
            version: self.header.version(),
            previous_block_hash: self.header.previous_block_hash().to_hex(),
            merkle_root: self.header.merkle_root().to_hex(),
            timestamp: self.header.timestamp(),
            bits: self.header.bits().to_consensus(),
            nonce: self.header.nonce(),
            target: self.target_hex()?,
            difficulty: self.difficulty()?,
            transaction_count: self.transaction_count(),
        })
    }
}

impl<D: TransactionDecoder> fmt::Display for Block<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {} (height: ", self.hash)?;
        match self.height {
            Some(height) => write!(f, "{height}")?,
            None => f.write_str("unknown")?,
        }
        write!(f, ", transactions: {})", self.transaction_count())
    }
}

/// Flat view of a block's header fields and derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block hash, display-order hex.
    pub hash: String,
    /// Header version.
    pub version: u32,
    /// Previous block hash, display-order hex.
    pub previous_block_hash: String,
    /// Merkle root, display-order hex.
    pub merkle_root: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u32,
    /// Compact difficulty bits.
    pub bits: u32,
    /// Header nonce.
    pub nonce: u32,
    /// Target as 64 hex digits.
    pub target: String,
    /// Reported difficulty.
    pub difficulty: f64,
    /// Number of transactions decoded so far.
    pub transaction_count: usize,
}
