//! Ancestry queries
//!
//! Every block stores its height, the length of its longest parent path to
//! genesis. A block can only be an ancestor of blocks strictly higher than
//! itself, which bounds the backward search of [`is_dag_ancestor_of`] to the
//! height band between the two blocks.

use consensus_core::errors::ConsensusResult;
use consensus_core::{BlockHashSet, Hash, ZERO_HASH};
use std::collections::VecDeque;

use crate::consensus::storage::ConsensusReader;

/// Height of a new block with the given direct parents
pub fn calc_height<R: ConsensusReader + ?Sized>(reader: &R, parents: &[Hash]) -> ConsensusResult<u64> {
    let mut max_parent_height = None;
    for parent in parents {
        let height = reader.height(parent)?;
        max_parent_height = Some(max_parent_height.map_or(height, |max: u64| max.max(height)));
    }
    Ok(max_parent_height.map_or(0, |max| max + 1))
}

/// Whether `ancestor` is in the past of `descendant`. A block counts as its own ancestor.
pub fn is_dag_ancestor_of<R: ConsensusReader + ?Sized>(reader: &R, ancestor: Hash, descendant: Hash) -> ConsensusResult<bool> {
    if ancestor == descendant {
        return Ok(true);
    }
    let ancestor_height = reader.height(&ancestor)?;
    if reader.height(&descendant)? <= ancestor_height {
        return Ok(false);
    }

    let mut visited = BlockHashSet::new();
    let mut queue = VecDeque::from([descendant]);
    while let Some(current) = queue.pop_front() {
        let header = reader.header(&current)?;
        for parent in header.direct_parents() {
            if *parent == ancestor {
                return Ok(true);
            }
            if visited.insert(*parent) && reader.height(parent)? > ancestor_height {
                queue.push_back(*parent);
            }
        }
    }
    Ok(false)
}

/// Whether `ancestor` is on the selected-parent chain of `descendant` (inclusive)
pub fn is_chain_ancestor_of<R: ConsensusReader + ?Sized>(reader: &R, ancestor: Hash, descendant: Hash) -> ConsensusResult<bool> {
    let target_blue_score = reader.ghostdag_data(&ancestor)?.blue_score;
    let mut current = descendant;
    loop {
        if current == ancestor {
            return Ok(true);
        }
        let data = reader.ghostdag_data(&current)?;
        if data.blue_score <= target_blue_score || data.selected_parent == ZERO_HASH {
            return Ok(false);
        }
        current = data.selected_parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::storage::{ConsensusStorage, StagingArea};
    use consensus_core::ghostdag::GhostdagData;
    use consensus_core::header::Header;
    use consensus_core::BlueWorkType;
    use database::Database;
    use std::sync::Arc;

    /// Stages a header-only block with a made up chain of selected parents
    fn add(staging: &mut StagingArea, id: u64, parents: &[Hash], blue_score: u64) -> Hash {
        let parents_by_level = if parents.is_empty() { vec![] } else { vec![parents.to_vec()] };
        let header = Header::new_finalized(
            1,
            parents_by_level,
            Hash::from_u64_word(id),
            ZERO_HASH,
            ZERO_HASH,
            id,
            0x207fffff,
            0,
            0,
            BlueWorkType::from_u64(blue_score),
            blue_score,
            ZERO_HASH,
        );
        let hash = header.hash;
        let height = calc_height(&*staging, parents).unwrap();
        let mut data = GhostdagData::genesis(BlueWorkType::from_u64(blue_score));
        data.blue_score = blue_score;
        data.selected_parent = parents.first().copied().unwrap_or(ZERO_HASH);
        staging.stage_header(Arc::new(header)).unwrap();
        staging.stage_height(hash, height).unwrap();
        staging.stage_ghostdag_data(hash, Arc::new(data)).unwrap();
        hash
    }

    #[test]
    fn test_ancestry_queries() {
        let storage = ConsensusStorage::new(Database::in_memory());
        let mut staging = StagingArea::new(&storage);
        //   G <- A <- B <- D
        //    \          /
        //     <-- C <--
        let g = add(&mut staging, 1, &[], 0);
        let a = add(&mut staging, 2, &[g], 1);
        let b = add(&mut staging, 3, &[a], 2);
        let c = add(&mut staging, 4, &[g], 1);
        let d = add(&mut staging, 5, &[b, c], 4);

        assert_eq!(staging.height(&d).unwrap(), 3);
        assert!(is_dag_ancestor_of(&staging, g, d).unwrap());
        assert!(is_dag_ancestor_of(&staging, c, d).unwrap());
        assert!(is_dag_ancestor_of(&staging, d, d).unwrap());
        assert!(!is_dag_ancestor_of(&staging, c, b).unwrap());
        assert!(!is_dag_ancestor_of(&staging, d, a).unwrap());

        assert!(is_chain_ancestor_of(&staging, a, d).unwrap());
        assert!(is_chain_ancestor_of(&staging, g, d).unwrap());
        assert!(!is_chain_ancestor_of(&staging, c, d).unwrap());
    }
}
