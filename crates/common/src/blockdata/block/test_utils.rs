//! Synthetic transactions for exercising the stream parser without a full
//! transaction decoder.
//!
//! A synthetic transaction is one length byte followed by that many bytes,
//! which double as the unlocking script of its only input.

use std::io;

use crate::{
    blockdata::{
        block::BlockHeader,
        transaction::{BlockTransaction, TransactionDecoder},
    },
    consensus::{VarInt, serialize},
    hashes::Hash256,
    network::Network,
    pow::CompactBits,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SyntheticTransaction(pub(crate) Vec<u8>);

impl BlockTransaction for SyntheticTransaction {
    fn first_input_script(&self) -> Option<&[u8]> {
        Some(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LengthPrefixedDecoder;

impl TransactionDecoder for LengthPrefixedDecoder {
    type Transaction = SyntheticTransaction;
    type Error = io::Error;

    fn decode_transaction(
        &self,
        buffer: &[u8],
        _network: Network,
        check_size: bool,
    ) -> Result<(SyntheticTransaction, usize), io::Error> {
        let (&len, rest) = buffer
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "empty buffer"))?;
        let body = rest
            .get(..usize::from(len))
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "short transaction"))?;
        let consumed = body.len() + 1;

        if check_size && consumed != buffer.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "trailing bytes"));
        }

        Ok((SyntheticTransaction(body.to_vec()), consumed))
    }
}

/// Concatenates length-prefixed synthetic transactions.
pub(crate) fn synthetic_payload(bodies: &[&[u8]]) -> Vec<u8> {
    let mut payload = Vec::new();
    for body in bodies {
        payload.push(u8::try_from(body.len()).unwrap());
        payload.extend_from_slice(body);
    }
    payload
}

pub(crate) fn test_header() -> BlockHeader {
    BlockHeader::new(
        0x2000_0000,
        Hash256::from_byte_array([0x22; 32]),
        Hash256::from_byte_array([0x33; 32]),
        1_600_000_000,
        CompactBits::from_consensus(0x1d00ffff),
        42,
    )
}

/// Serializes `header`, a transaction count and the synthetic transactions.
pub(crate) fn synthetic_block(header: &BlockHeader, bodies: &[&[u8]]) -> Vec<u8> {
    let mut raw = header.to_wire_bytes().to_vec();
    raw.extend(serialize(&VarInt(bodies.len() as u64)));
    raw.extend(synthetic_payload(bodies));
    raw
}
