use stokes_hashes::{BlockHash, Hasher};

use crate::header::Header;
use crate::Hash;

/// Computes the hash of a block header over every field except the cached hash
pub fn hash(header: &Header) -> Hash {
    let mut hasher = BlockHash::new();
    hasher.write_u16(header.version).write_u64(header.parents_by_level.len() as u64);
    for level in &header.parents_by_level {
        hasher.write_u64(level.len() as u64);
        for parent in level {
            hasher.update(parent);
        }
    }
    hasher
        .update(header.hash_merkle_root)
        .update(header.accepted_id_merkle_root)
        .update(header.utxo_commitment)
        .write_u64(header.timestamp)
        .write_u32(header.bits)
        .write_u64(header.nonce)
        .write_u64(header.daa_score)
        .write_u64(header.blue_score)
        .write_var_bytes(&header.blue_work.to_le_bytes())
        .update(header.pruning_point);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlueWorkType, ZERO_HASH};

    #[test]
    fn test_level_boundaries_are_hashed() {
        let a = Hash::from_le_u64([1, 0, 0, 0]);
        let b = Hash::from_le_u64([2, 0, 0, 0]);
        let make = |parents: Vec<Vec<Hash>>| {
            Header::new_finalized(1, parents, ZERO_HASH, ZERO_HASH, ZERO_HASH, 0, 0, 0, 0, BlueWorkType::ZERO, 0, ZERO_HASH)
        };
        assert_ne!(make(vec![vec![a, b]]).hash, make(vec![vec![a], vec![b]]).hash);
    }
}
