/// Block aggregate, header codec and transaction stream.
pub mod block;

/// Block height embedded in the coinbase transaction.
pub mod coinbase;

/// Transaction decoder capability.
pub mod transaction;
