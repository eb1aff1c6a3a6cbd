//! Multiset hash accumulator for UTXO set commitments
//!
//! Elements are mapped to 256-bit integers with a domain-separated hash and
//! summed modulo 2^256. Insertion order never affects the result and removal
//! is exact, so a set can be updated incrementally by diffs and compared by
//! its finalized digest.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use stokes_hashes::{Hash, Hasher, MuHashElementHash, MuHashFinalizeHash};

#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuHash {
    acc: [u8; 32],
}

pub const EMPTY_MUHASH: MuHash = MuHash { acc: [0u8; 32] };

impl MuHash {
    pub fn new() -> Self {
        EMPTY_MUHASH
    }

    pub fn add_element(&mut self, data: &[u8]) {
        let (sum, _) = self.value().overflowing_add(element_value(data));
        self.set_value(sum);
    }

    pub fn remove_element(&mut self, data: &[u8]) {
        let (diff, _) = self.value().overflowing_sub(element_value(data));
        self.set_value(diff);
    }

    /// Merges another accumulator into this one (set union of disjoint sets)
    pub fn combine(&mut self, other: &MuHash) {
        let (sum, _) = self.value().overflowing_add(other.value());
        self.set_value(sum);
    }

    pub fn finalize(&self) -> Hash {
        MuHashFinalizeHash::hash(self.acc)
    }

    fn value(&self) -> U256 {
        U256::from_little_endian(&self.acc)
    }

    fn set_value(&mut self, v: U256) {
        v.to_little_endian(&mut self.acc);
    }
}

impl std::fmt::Debug for MuHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MuHash({})", self.finalize())
    }
}

fn element_value(data: &[u8]) -> U256 {
    U256::from_little_endian(MuHashElementHash::hash(data).as_bytes())
}
