use serde::{Deserialize, Serialize};

use crate::{hashing, BlueWorkType, Hash};

/// Block header. The `hash` field caches the header hash and is excluded from hashing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: Hash,
    pub version: u16,
    pub parents_by_level: Vec<Vec<Hash>>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub daa_score: u64,
    pub blue_work: BlueWorkType,
    pub blue_score: u64,
    pub pruning_point: Hash,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new_finalized(
        version: u16,
        parents_by_level: Vec<Vec<Hash>>,
        hash_merkle_root: Hash,
        accepted_id_merkle_root: Hash,
        utxo_commitment: Hash,
        timestamp: u64,
        bits: u32,
        nonce: u64,
        daa_score: u64,
        blue_work: BlueWorkType,
        blue_score: u64,
        pruning_point: Hash,
    ) -> Self {
        let mut header = Self {
            hash: Default::default(),
            version,
            parents_by_level,
            hash_merkle_root,
            accepted_id_merkle_root,
            utxo_commitment,
            timestamp,
            bits,
            nonce,
            daa_score,
            blue_work,
            blue_score,
            pruning_point,
        };
        header.finalize();
        header
    }

    /// Recomputes and caches the header hash. Must be called after any field mutation.
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    /// Direct parents (level 0)
    pub fn direct_parents(&self) -> &[Hash] {
        self.parents_by_level.first().map(|parents| parents.as_slice()).unwrap_or(&[])
    }

    /// Parents at `level`, where missing levels are implicitly `[genesis]`
    pub fn parents_at_level<'a>(&'a self, level: usize, genesis: &'a Hash) -> &'a [Hash] {
        match self.parents_by_level.get(level) {
            Some(parents) => parents.as_slice(),
            None if self.parents_by_level.is_empty() => &[],
            None => std::slice::from_ref(genesis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZERO_HASH;

    fn sample() -> Header {
        Header::new_finalized(
            1,
            vec![vec![Hash::from_le_u64([1, 0, 0, 0])]],
            Hash::from_le_u64([2, 0, 0, 0]),
            ZERO_HASH,
            Hash::from_le_u64([3, 0, 0, 0]),
            1_700_000_000_000,
            0x207fffff,
            5,
            10,
            BlueWorkType::from(42u64),
            9,
            ZERO_HASH,
        )
    }

    #[test]
    fn test_finalize_detects_mutation() {
        let mut header = sample();
        let original = header.hash;
        header.nonce += 1;
        assert_eq!(header.hash, original);
        header.finalize();
        assert_ne!(header.hash, original);
    }

    #[test]
    fn test_parents_at_level() {
        let header = sample();
        let genesis = Hash::from_le_u64([7, 0, 0, 0]);
        assert_eq!(header.direct_parents(), &[Hash::from_le_u64([1, 0, 0, 0])]);
        assert_eq!(header.parents_at_level(3, &genesis), &[genesis]);
    }

    #[test]
    fn test_bincode_preserves_hash() {
        let header = sample();
        let bytes = bincode::serialize(&header).unwrap();
        let decoded: Header = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, header);
    }
}
