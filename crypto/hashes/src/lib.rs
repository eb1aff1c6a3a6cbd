pub mod hasher;
pub mod hashers;
pub mod merkle;

pub use hasher::Hasher;
pub use hashers::{BlockHash, MerkleBranchHash, MuHashElementHash, MuHashFinalizeHash, TransactionId};
pub use merkle::calc_merkle_root;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const HASH_SIZE: usize = 32;

/// The all-zero hash. Used as the "no selected parent" marker of genesis and
/// as the empty merkle root.
pub const ZERO_HASH: Hash = Hash([0u8; HASH_SIZE]);

/// A 32-byte hash wrapper used across the project.
///
/// Ordering is lexicographic over the raw bytes. Consensus relies on this
/// ordering as the tie-break between blocks of equal blue work.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Constructs a hash from four little-endian u64s (used in tests)
    pub const fn from_le_u64(parts: [u64; 4]) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let mut i = 0;
        while i < 4 {
            let le = parts[i].to_le_bytes();
            let mut j = 0;
            while j < 8 {
                bytes[i * 8 + j] = le[j];
                j += 1;
            }
            i += 1;
        }
        Self(bytes)
    }

    /// Shorthand for `from_le_u64([word, 0, 0, 0])`
    pub const fn from_u64_word(word: u64) -> Self {
        Self::from_le_u64([word, 0, 0, 0])
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, std::array::TryFromSliceError> {
        Ok(Self(slice.try_into()?))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; HASH_SIZE] {
    fn from(h: Hash) -> Self {
        h.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

#[derive(Debug)]
pub struct ParseHashError(String);

impl fmt::Display for ParseHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hash string: {}", self.0)
    }
}

impl std::error::Error for ParseHashError {}

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseHashError(e.to_string()))?;
        Hash::try_from_slice(&bytes).map_err(|_| ParseHashError(format!("expected {} bytes, got {}", HASH_SIZE, bytes.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_le_u64_layout() {
        let h = Hash::from_le_u64([1, 2, 3, 4]);
        let bytes = h.as_bytes();
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_le_bytes());
        assert_eq!(&bytes[24..32], &4u64.to_le_bytes());
    }

    #[test]
    fn display_parse() {
        let h = Hash::from_le_u64([0xdead, 0, 7, u64::MAX]);
        let parsed: Hash = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
        assert!("abcd".parse::<Hash>().is_err());
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = Hash::from_bytes([0u8; 32]);
        let mut b_bytes = [0u8; 32];
        b_bytes[31] = 1;
        let mut c_bytes = [0u8; 32];
        c_bytes[0] = 1;
        assert!(a < Hash::from_bytes(b_bytes));
        assert!(Hash::from_bytes(b_bytes) < Hash::from_bytes(c_bytes));
        assert!(ZERO_HASH.is_zero());
    }
}
