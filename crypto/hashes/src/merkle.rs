use crate::hasher::Hasher;
use crate::hashers::MerkleBranchHash;
use crate::{Hash, ZERO_HASH};

/// Computes the merkle root over the given leaves. An odd node at any level
/// is paired with itself. The root of an empty list is [`ZERO_HASH`].
pub fn calc_merkle_root(leaves: impl ExactSizeIterator<Item = Hash>) -> Hash {
    if leaves.len() == 0 {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash> = leaves.collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let (left, right) = match pair {
                    [left, right] => (left, right),
                    [single] => (single, single),
                    _ => unreachable!(),
                };
                let mut hasher = MerkleBranchHash::new();
                hasher.update(left).update(right);
                hasher.finalize()
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(left: Hash, right: Hash) -> Hash {
        let mut hasher = MerkleBranchHash::new();
        hasher.update(left).update(right);
        hasher.finalize()
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(calc_merkle_root(Vec::new().into_iter()), ZERO_HASH);
        let h = Hash::from_u64_word(1);
        assert_eq!(calc_merkle_root(vec![h].into_iter()), h);
    }

    #[test]
    fn test_odd_leaf_is_duplicated() {
        let (a, b, c) = (Hash::from_u64_word(1), Hash::from_u64_word(2), Hash::from_u64_word(3));
        let expected = branch(branch(a, b), branch(c, c));
        assert_eq!(calc_merkle_root(vec![a, b, c].into_iter()), expected);
    }
}
