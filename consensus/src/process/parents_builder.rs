//! Parents by level for new block headers
//!
//! Level 0 holds the direct parents. Each higher level L holds, for every
//! direct parent, either the parent itself when its block level reaches L or
//! the parent's own level-L parents. The pruning proof walks these links.

use consensus_core::errors::ConsensusResult;
use consensus_core::pow::calc_block_level;
use consensus_core::Hash;
use std::collections::BTreeSet;

use crate::consensus::storage::ConsensusReader;

pub struct ParentsManager {
    genesis_hash: Hash,
    max_block_level: u8,
}

impl ParentsManager {
    pub fn new(genesis_hash: Hash, max_block_level: u8) -> Self {
        Self { genesis_hash, max_block_level }
    }

    /// Level of a block in the multi-level DAG. Genesis sits on every level.
    pub fn block_level(&self, hash: &Hash) -> u8 {
        if *hash == self.genesis_hash {
            return self.max_block_level;
        }
        calc_block_level(hash, self.max_block_level)
    }

    /// Expected `parents_by_level` of a block with the given direct parents. Levels that
    /// would only hold genesis are left out.
    pub fn calc_block_parents<R: ConsensusReader + ?Sized>(&self, reader: &R, direct_parents: &[Hash]) -> ConsensusResult<Vec<Vec<Hash>>> {
        self.calc_block_parents_with(reader, direct_parents, |hash| self.block_level(hash))
    }

    fn calc_block_parents_with<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        direct_parents: &[Hash],
        level_of: impl Fn(&Hash) -> u8,
    ) -> ConsensusResult<Vec<Vec<Hash>>> {
        let mut level_zero = direct_parents.to_vec();
        level_zero.sort();
        let mut parents_by_level = vec![level_zero];

        let mut headers = Vec::with_capacity(direct_parents.len());
        for parent in direct_parents {
            headers.push((*parent, level_of(parent), reader.header(parent)?));
        }

        for level in 1..=self.max_block_level as usize {
            let mut level_parents = BTreeSet::new();
            for (hash, parent_level, header) in headers.iter() {
                if *parent_level as usize >= level {
                    level_parents.insert(*hash);
                } else {
                    level_parents.extend(header.parents_at_level(level, &self.genesis_hash).iter().copied());
                }
            }
            if level_parents.is_empty() || (level_parents.len() == 1 && level_parents.contains(&self.genesis_hash)) {
                break;
            }
            parents_by_level.push(level_parents.into_iter().collect());
        }
        Ok(parents_by_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::storage::{ConsensusStorage, StagingArea};
    use consensus_core::config::genesis::SIMNET_GENESIS;
    use consensus_core::header::Header;
    use consensus_core::{BlockHashMap, BlueWorkType, ZERO_HASH};
    use database::Database;
    use std::sync::Arc;

    fn header(id: u64, parents_by_level: Vec<Vec<Hash>>) -> Header {
        Header::new_finalized(
            1,
            parents_by_level,
            Hash::from_u64_word(id),
            ZERO_HASH,
            ZERO_HASH,
            id,
            0x207fffff,
            0,
            0,
            BlueWorkType::from_u64(id),
            id,
            ZERO_HASH,
        )
    }

    #[test]
    fn test_low_level_parents_collapse_to_level_zero() {
        let storage = ConsensusStorage::new(Database::in_memory());
        let genesis = SIMNET_GENESIS.hash();
        let a = header(1, vec![vec![genesis]]);
        let b = header(2, vec![vec![genesis]]);
        let mut staging = StagingArea::new(&storage);
        staging.stage_header(Arc::new(SIMNET_GENESIS.header())).unwrap();
        staging.stage_header(Arc::new(a.clone())).unwrap();
        staging.stage_header(Arc::new(b.clone())).unwrap();

        let manager = ParentsManager::new(genesis, 225);
        let parents = manager.calc_block_parents_with(&staging, &[b.hash, a.hash], |h| if *h == genesis { 225 } else { 0 }).unwrap();
        let mut expected = vec![a.hash, b.hash];
        expected.sort();
        assert_eq!(parents, vec![expected]);

        // A direct genesis child has only level zero as well
        let parents = manager.calc_block_parents(&staging, &[genesis]).unwrap();
        assert_eq!(parents, vec![vec![genesis]]);
    }

    #[test]
    fn test_high_level_parent_propagates() {
        let storage = ConsensusStorage::new(Database::in_memory());
        let genesis = SIMNET_GENESIS.hash();
        // `high` is a level-2 block, `low` builds on it, `side` is a sibling of `high`
        let high = header(1, vec![vec![genesis]]);
        let side = header(2, vec![vec![genesis]]);
        let low = header(3, vec![vec![high.hash], vec![high.hash], vec![high.hash]]);
        let levels: BlockHashMap<u8> = [(genesis, 225), (high.hash, 2), (side.hash, 0), (low.hash, 0)].into_iter().collect();

        let mut staging = StagingArea::new(&storage);
        for h in [SIMNET_GENESIS.header(), high.clone(), side.clone(), low.clone()] {
            staging.stage_header(Arc::new(h)).unwrap();
        }

        let manager = ParentsManager::new(genesis, 225);
        let parents = manager.calc_block_parents_with(&staging, &[low.hash, side.hash], |h| levels[h]).unwrap();
        assert_eq!(parents.len(), 3);
        assert_eq!(parents[1].iter().copied().collect::<BTreeSet<_>>(), [high.hash, genesis].into_iter().collect());
        assert_eq!(parents[2], parents[1]);

        // Directly on top of the level-2 block
        let parents = manager.calc_block_parents_with(&staging, &[high.hash], |h| levels[h]).unwrap();
        assert_eq!(parents, vec![vec![high.hash], vec![high.hash], vec![high.hash]]);
    }

    #[test]
    fn test_genesis_level() {
        let genesis = SIMNET_GENESIS.hash();
        let manager = ParentsManager::new(genesis, 225);
        assert_eq!(manager.block_level(&genesis), 225);
    }
}
