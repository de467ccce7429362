//! Transaction decoding capability.
//!
//! Block decoding does not know how a transaction is laid out. It hands the
//! remaining bytes of a block to a [`TransactionDecoder`], which returns one
//! transaction and the number of bytes it occupied. [`BitcoinTransactionDecoder`]
//! is the production implementation, backed by the `bitcoin` crate; tests use
//! simpler decoders with synthetic transactions.

use bitcoin::Transaction;
use thiserror::Error;

use crate::{
    consensus::{EncodeDecodeError, deserialize_partial},
    network::Network,
};

/// A decoded transaction, as far as block decoding needs to see it.
pub trait BlockTransaction: Clone + std::fmt::Debug {
    /// Returns the unlocking script of the first input, or `None` if the
    /// transaction has no inputs.
    fn first_input_script(&self) -> Option<&[u8]>;
}

/// Decodes one transaction from the front of a buffer.
pub trait TransactionDecoder {
    /// The decoded transaction type.
    type Transaction: BlockTransaction;

    /// The error reported for malformed transactions.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decodes the transaction at the start of `buffer`.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Bytes starting at the transaction; may extend past it
    /// * `network` - Network the block belongs to
    /// * `check_size` - When true, the transaction must occupy the whole
    ///   buffer. Block decoding always passes false.
    ///
    /// # Returns
    ///
    /// * `Ok((transaction, consumed))` - The transaction and the number of
    ///   bytes it occupied at the start of `buffer`
    /// * `Err(Self::Error)` - If the bytes are not a valid transaction
    fn decode_transaction(
        &self,
        buffer: &[u8],
        network: Network,
        check_size: bool,
    ) -> Result<(Self::Transaction, usize), Self::Error>;
}

impl BlockTransaction for Transaction {
    fn first_input_script(&self) -> Option<&[u8]> {
        self.input.first().map(|txin| txin.script_sig.as_bytes())
    }
}

/// Errors reported by [`BitcoinTransactionDecoder`].
#[derive(Debug, Error)]
pub enum BitcoinDecodeError {
    /// The bytes are not a valid consensus-encoded transaction.
    #[error("Consensus decoding failed: {0}")]
    Consensus(#[from] EncodeDecodeError),

    /// `check_size` was requested and bytes remained after the transaction.
    #[error("Transaction occupies {consumed} of {available} bytes")]
    TrailingBytes {
        /// Bytes the transaction occupied.
        consumed: usize,
        /// Bytes supplied.
        available: usize,
    },
}

/// Decodes consensus-encoded transactions (including segwit) with the
/// `bitcoin` crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitcoinTransactionDecoder;

impl TransactionDecoder for BitcoinTransactionDecoder {
    type Transaction = Transaction;
    type Error = BitcoinDecodeError;

    fn decode_transaction(
        &self,
        buffer: &[u8],
        _network: Network,
        check_size: bool,
    ) -> Result<(Transaction, usize), BitcoinDecodeError> {
        let (transaction, consumed) = deserialize_partial::<Transaction>(buffer)?;

        if check_size && consumed != buffer.len() {
            return Err(BitcoinDecodeError::TrailingBytes {
                consumed,
                available: buffer.len(),
            });
        }

        Ok((transaction, consumed))
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Witness, locktime::absolute,
        transaction::Version,
    };

    use super::*;
    use crate::consensus::serialize;

    /// Create a minimal test transaction for use in tests
    fn create_test_transaction(script_sig: Vec<u8>) -> Transaction {
        let txin = TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::from_bytes(script_sig),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        };

        let txout = TxOut {
            value: Amount::from_sat(50),
            script_pubkey: ScriptBuf::new(),
        };

        Transaction {
            version: Version::ONE,
            lock_time: absolute::LockTime::ZERO,
            input: vec![txin],
            output: vec![txout],
        }
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        let transaction = create_test_transaction(vec![0x03, 0x4a, 0x01, 0x02]);
        let mut buffer = serialize(&transaction);
        let encoded_len = buffer.len();
        buffer.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let (decoded, consumed) = BitcoinTransactionDecoder
            .decode_transaction(&buffer, Network::Mainnet, false)
            .unwrap();

        assert_eq!(decoded, transaction);
        assert_eq!(consumed, encoded_len);
    }

    #[test]
    fn test_check_size_rejects_trailing_bytes() {
        let transaction = create_test_transaction(vec![0x01, 0x01]);
        let mut buffer = serialize(&transaction);

        assert!(
            BitcoinTransactionDecoder
                .decode_transaction(&buffer, Network::Mainnet, true)
                .is_ok()
        );

        buffer.push(0x00);
        assert!(matches!(
            BitcoinTransactionDecoder.decode_transaction(&buffer, Network::Mainnet, true),
            Err(BitcoinDecodeError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn test_malformed_transaction() {
        let result = BitcoinTransactionDecoder.decode_transaction(
            &[0x01, 0x00, 0x00],
            Network::Mainnet,
            false,
        );
        assert!(matches!(result, Err(BitcoinDecodeError::Consensus(_))));
    }

    #[test]
    fn test_first_input_script() {
        let transaction = create_test_transaction(vec![0x03, 0x4a, 0x01, 0x02]);
        assert_eq!(
            transaction.first_input_script(),
            Some(&[0x03, 0x4a, 0x01, 0x02][..])
        );

        let mut no_inputs = transaction;
        no_inputs.input.clear();
        assert_eq!(no_inputs.first_input_script(), None);
    }
}
