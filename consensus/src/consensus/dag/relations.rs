//! Tips and the selected chain of the virtual

use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, ZERO_HASH};
use std::collections::BTreeMap;

use crate::consensus::storage::ConsensusReader;

/// Replaces the parents of a newly added block by the block itself in the tip set
pub fn update_tips(tips: &mut Vec<Hash>, new_block: Hash, parents: &[Hash]) {
    tips.retain(|tip| !parents.contains(tip));
    if !tips.contains(&new_block) {
        tips.push(new_block);
    }
}

/// Blue score to hash index of the blocks on the selected chain of the committed sink.
///
/// Blue scores strictly increase along a selected chain, so the index answers
/// "which chain block sits at or below this blue score" with a range lookup
/// instead of a walk over selected parents.
#[derive(Clone, Debug, Default)]
pub struct SelectedChainIndex {
    chain: BTreeMap<u64, Hash>,
}

impl SelectedChainIndex {
    /// Rebuilds the index by walking the selected chain of `sink` down to genesis
    pub fn from_sink<R: ConsensusReader + ?Sized>(reader: &R, sink: Hash) -> ConsensusResult<Self> {
        let mut chain = BTreeMap::new();
        let mut current = sink;
        while current != ZERO_HASH {
            let data = reader.ghostdag_data(&current)?;
            chain.insert(data.blue_score, current);
            current = data.selected_parent;
        }
        Ok(Self { chain })
    }

    pub fn contains(&self, hash: &Hash, blue_score: u64) -> bool {
        self.chain.get(&blue_score) == Some(hash)
    }

    /// The highest chain block with blue score at most `blue_score`
    pub fn highest_at_or_below(&self, blue_score: u64) -> Option<Hash> {
        self.chain.range(..=blue_score).next_back().map(|(_, hash)| *hash)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Applies a reorg: drops the chain above `fork_blue_score` and appends the new blocks
    pub fn apply_reorg(&mut self, fork_blue_score: u64, added: impl IntoIterator<Item = (u64, Hash)>) {
        self.chain.split_off(&(fork_blue_score + 1));
        self.chain.extend(added);
    }

    /// The highest selected-chain ancestor of `from` (inclusive) whose blue score is at most
    /// `blue_score`. Walks selected parents only until reaching a block on the indexed chain.
    pub fn chain_block_at_or_below<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        from: Hash,
        blue_score: u64,
    ) -> ConsensusResult<Hash> {
        let mut current = from;
        loop {
            let data = reader.ghostdag_data(&current)?;
            if data.blue_score <= blue_score {
                return Ok(current);
            }
            if self.contains(&current, data.blue_score) {
                if let Some(hash) = self.highest_at_or_below(blue_score) {
                    return Ok(hash);
                }
            }
            if data.selected_parent == ZERO_HASH {
                return Ok(current);
            }
            current = data.selected_parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_tips() {
        let (a, b, c) = (Hash::from_u64_word(1), Hash::from_u64_word(2), Hash::from_u64_word(3));
        let mut tips = vec![a, b];
        update_tips(&mut tips, c, &[a]);
        assert_eq!(tips, vec![b, c]);
        update_tips(&mut tips, c, &[a]);
        assert_eq!(tips, vec![b, c]);
    }

    #[test]
    fn test_index_reorg() {
        let mut index = SelectedChainIndex::default();
        index.apply_reorg(0, [(0, Hash::from_u64_word(10)), (2, Hash::from_u64_word(12)), (5, Hash::from_u64_word(15))]);
        assert_eq!(index.highest_at_or_below(4), Some(Hash::from_u64_word(12)));
        assert!(index.contains(&Hash::from_u64_word(15), 5));

        index.apply_reorg(2, [(3, Hash::from_u64_word(23))]);
        assert_eq!(index.len(), 3);
        assert!(!index.contains(&Hash::from_u64_word(15), 5));
        assert_eq!(index.highest_at_or_below(100), Some(Hash::from_u64_word(23)));
    }
}
