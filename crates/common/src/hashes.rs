pub use bitcoin::hashes::{Hash, sha256d::Hash as Sha256dHash};

use std::{fmt, str::FromStr};

use hex::FromHexError;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::util::{hex_to_hash256, reversed, to_hex};

/// Computes the double SHA-256 of `data`, in the byte order it comes out of
/// the hash function (wire order).
pub fn hash2(data: &[u8]) -> [u8; 32] {
    Sha256dHash::hash(data).to_byte_array()
}

/// A 32-byte identifier kept in display order.
///
/// Block hashes, previous-block hashes and merkle roots travel on the wire
/// in reversed byte order. `Hash256` always stores the canonical (display)
/// order, so the hex produced by [`Hash256::to_hex`] is the familiar
/// explorer representation, e.g. the genesis block hash
/// `000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero hash, used as the previous-block hash of a genesis block.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// Wraps bytes that are already in display order.
    pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    /// Builds a hash from bytes in wire order, reversing them.
    pub fn from_wire_bytes(bytes: [u8; 32]) -> Self {
        Hash256(reversed(&bytes))
    }

    /// Returns the bytes in display order.
    pub fn as_byte_array(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the bytes in wire order.
    pub fn to_wire_bytes(&self) -> [u8; 32] {
        reversed(&self.0)
    }

    /// Lowercase hex of the display-order bytes.
    pub fn to_hex(&self) -> String {
        to_hex(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = FromHexError;

    /// Parses 64 hex digits in display order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_hash256(s)
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash2_matches_sha256d() {
        // sha256d("hello")
        let digest = hash2(b"hello");
        assert_eq!(
            hex::encode(digest),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_wire_order_is_reversed() {
        let mut wire = [0u8; 32];
        wire[0] = 0xaa;
        wire[31] = 0x01;

        let hash = Hash256::from_wire_bytes(wire);
        assert_eq!(hash.as_byte_array()[0], 0x01);
        assert_eq!(hash.as_byte_array()[31], 0xaa);
        assert_eq!(hash.to_wire_bytes(), wire);
    }

    #[test]
    fn test_hex_parse_and_display() {
        let hex = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
        let hash: Hash256 = hex.parse().unwrap();
        assert_eq!(hash.to_string(), hex);
        assert_eq!(hash.as_byte_array()[0], 0x00);
        assert_eq!(hash.as_byte_array()[31], 0x6f);
    }

    #[test]
    fn test_invalid_hex() {
        assert!("not-a-hash".parse::<Hash256>().is_err());
        assert!("00".parse::<Hash256>().is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = Hash256::from_byte_array([0x11; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(32)));

        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
