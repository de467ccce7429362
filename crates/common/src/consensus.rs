mod compact_size;

pub use bitcoin::consensus::encode::{
    Error as EncodeDecodeError, VarInt, deserialize_partial, serialize,
};
pub use compact_size::read_compact_size;
