//! Pruning point selection and history pruning
//!
//! The pruning point trails the selected chain by `pruning_depth` blue score.
//! Everything in its past loses its body, UTXO diff and acceptance data, while
//! headers, GHOSTDAG data and heights are kept for the pruning proof.

use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::ConsensusResult;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::{BlockHashSet, Hash, ZERO_HASH};
use std::collections::VecDeque;
use tracing::trace;

use crate::consensus::dag::SelectedChainIndex;
use crate::consensus::storage::{ConsensusReader, StagingArea};

/// Block pruning manager
pub struct PruningManager {
    genesis_hash: Hash,
    pruning_depth: u64,
}

impl PruningManager {
    pub fn new(genesis_hash: Hash, pruning_depth: u64) -> Self {
        Self { genesis_hash, pruning_depth }
    }

    pub fn pruning_depth(&self) -> u64 {
        self.pruning_depth
    }

    /// The pruning point a block with `ghostdag_data` must reference: the highest chain block at
    /// least `pruning_depth` blue score below it, unless the selected parent already points higher.
    pub fn expected_pruning_point<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        chain_index: &SelectedChainIndex,
        ghostdag_data: &GhostdagData,
    ) -> ConsensusResult<Hash> {
        let selected_parent = ghostdag_data.selected_parent;
        if selected_parent == ZERO_HASH {
            return Ok(self.genesis_hash);
        }
        let selected_parent_pruning_point =
            if selected_parent == self.genesis_hash { self.genesis_hash } else { reader.header(&selected_parent)?.pruning_point };

        let Some(target_blue_score) = ghostdag_data.blue_score.checked_sub(self.pruning_depth) else {
            return Ok(selected_parent_pruning_point);
        };
        let candidate = chain_index.chain_block_at_or_below(reader, selected_parent, target_blue_score)?;
        let candidate_blue_score = reader.ghostdag_data(&candidate)?.blue_score;
        let current_blue_score = reader.ghostdag_data(&selected_parent_pruning_point)?.blue_score;
        if candidate_blue_score > current_blue_score {
            Ok(candidate)
        } else {
            Ok(selected_parent_pruning_point)
        }
    }

    /// All blocks in the past of `pruning_point` that still hold data, ordered by ascending
    /// height so that pruning in this order never leaves a pruned block above an unpruned one
    pub fn collect_prunable<R: ConsensusReader + ?Sized>(&self, reader: &R, pruning_point: Hash) -> ConsensusResult<Vec<Hash>> {
        let mut visited = BlockHashSet::new();
        let mut queue: VecDeque<Hash> = reader.header(&pruning_point)?.direct_parents().iter().copied().collect();
        let mut prunable = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if reader.get_status(&current)? == BlockStatus::Pruned {
                continue;
            }
            prunable.push((reader.height(&current)?, current));
            queue.extend(reader.header(&current)?.direct_parents().iter().copied());
        }
        prunable.sort();
        trace!(count = prunable.len(), %pruning_point, "collected prunable blocks");
        Ok(prunable.into_iter().map(|(_, hash)| hash).collect())
    }

    /// Stages the deletion of the data of `hashes` and marks them pruned
    pub fn stage_prune(&self, staging: &mut StagingArea, hashes: &[Hash]) -> ConsensusResult<()> {
        for hash in hashes {
            staging.stage_block_data_deletion(*hash);
            staging.stage_status(*hash, BlockStatus::Pruned)?;
        }
        Ok(())
    }
}
