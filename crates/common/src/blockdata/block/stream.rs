//! Incremental decoding of the transactions that follow the header.
//!
//! The stream owns the bytes after the transaction count and a cursor into
//! them. Bytes before the cursor have been decoded into `transactions`;
//! bytes after it are pending. The cursor only moves forward, and only after
//! a transaction has decoded successfully.

use thiserror::Error;
use tracing::trace;

use crate::{
    blockdata::transaction::TransactionDecoder,
    error::{DecodeError, DecodeResult},
    network::Network,
};

/// The decoder reported a consumed length that does not fit the buffer.
#[derive(Debug, Error)]
#[error("Decoder consumed {consumed} bytes of {remaining} remaining")]
pub struct ConsumedLengthError {
    consumed: usize,
    remaining: usize,
}

/// Transactions decoded so far plus the bytes still pending.
#[derive(Debug, Clone)]
pub struct TransactionStream<D: TransactionDecoder> {
    decoder: D,
    network: Network,
    payload: Vec<u8>,
    cursor: usize,
    transactions: Vec<D::Transaction>,
}

impl<D: TransactionDecoder> TransactionStream<D> {
    /// Creates a stream over `payload` with nothing decoded yet.
    pub fn new(decoder: D, network: Network, payload: Vec<u8>) -> Self {
        TransactionStream {
            decoder,
            network,
            payload,
            cursor: 0,
            transactions: Vec::new(),
        }
    }

    /// Creates a stream from transactions that were decoded elsewhere, with
    /// nothing pending.
    pub fn from_transactions(
        decoder: D,
        network: Network,
        transactions: Vec<D::Transaction>,
    ) -> Self {
        TransactionStream {
            decoder,
            network,
            payload: Vec::new(),
            cursor: 0,
            transactions,
        }
    }

    /// Decodes up to `limit` more transactions; `0` decodes all that remain.
    ///
    /// Returns the number of transactions added. Once nothing is pending this
    /// returns `Ok(0)` without calling the decoder.
    ///
    /// # Errors
    ///
    /// * `DecodeError::TransactionDecode` - If a transaction fails to decode.
    ///   Transactions added earlier in the same call are kept and the cursor
    ///   stays at the start of the failing transaction.
    pub fn parse(&mut self, limit: usize) -> DecodeResult<usize> {
        let mut added = 0usize;
        while !self.is_exhausted() && (limit == 0 || added < limit) {
            self.parse_next()?;
            added = added.saturating_add(1);
        }
        Ok(added)
    }

    /// Decodes the transaction at the cursor and advances past it.
    fn parse_next(&mut self) -> DecodeResult<()> {
        let index = self.transactions.len();
        let remaining = self.pending_bytes();

        let (transaction, consumed) = self
            .decoder
            .decode_transaction(remaining, self.network, false)
            .map_err(|err| DecodeError::TransactionDecode {
                index,
                source: Box::new(err),
            })?;

        if consumed == 0 || consumed > remaining.len() {
            return Err(DecodeError::TransactionDecode {
                index,
                source: Box::new(ConsumedLengthError {
                    consumed,
                    remaining: remaining.len(),
                }),
            });
        }

        trace!(index, consumed, "Decoded transaction");
        self.transactions.push(transaction);
        self.cursor = self.cursor.saturating_add(consumed);
        Ok(())
    }

    /// Transactions decoded so far, in block order.
    pub fn transactions(&self) -> &[D::Transaction] {
        &self.transactions
    }

    /// Bytes that have not been decoded yet.
    pub fn pending_bytes(&self) -> &[u8] {
        self.payload.get(self.cursor..).unwrap_or_default()
    }

    /// Bytes already decoded into transactions.
    pub fn parsed_bytes(&self) -> &[u8] {
        self.payload.get(..self.cursor).unwrap_or_default()
    }

    /// Returns true when no bytes are pending.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.payload.len()
    }

    /// The network handed to the decoder.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The transaction decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}
