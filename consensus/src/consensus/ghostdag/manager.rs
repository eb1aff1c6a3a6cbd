//! GHOSTDAG data computation for new blocks and for the virtual

use consensus_core::errors::{ConsensusError, ConsensusResult, RuleError};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::pow::calc_work;
use consensus_core::{BlockHashSet, Hash, KType};
use std::collections::VecDeque;
use tracing::trace;

use super::protocol::{ColoringOutput, GhostdagProtocol};
use crate::consensus::dag::is_dag_ancestor_of;
use crate::consensus::storage::ConsensusReader;

pub struct GhostdagManager {
    genesis_hash: Hash,
    protocol: GhostdagProtocol,
    mergeset_size_limit: u64,
    merge_depth: u64,
}

impl GhostdagManager {
    pub fn new(genesis_hash: Hash, k: KType, mergeset_size_limit: u64, merge_depth: u64) -> Self {
        Self { genesis_hash, protocol: GhostdagProtocol::new(k), mergeset_size_limit, merge_depth }
    }

    pub fn genesis_ghostdag_data(&self, genesis_bits: u32) -> GhostdagData {
        GhostdagData::genesis(calc_work(genesis_bits))
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    /// The parent with the highest blue work, ties broken by the higher hash
    pub fn find_selected_parent<R: ConsensusReader + ?Sized>(&self, reader: &R, parents: &[Hash]) -> ConsensusResult<Hash> {
        let mut best: Option<SortableBlock> = None;
        for parent in parents {
            let candidate = SortableBlock::new(*parent, reader.ghostdag_data(parent)?.blue_work);
            if best.map_or(true, |current| candidate > current) {
                best = Some(candidate);
            }
        }
        best.map(|block| block.hash).ok_or(ConsensusError::Rule(RuleError::NoParents))
    }

    /// Blocks in the past of the new block but not in the past of its selected parent, other than the
    /// selected parent itself, sorted ascending by blue work then hash.
    ///
    /// Fails with [`RuleError::MergesetTooBig`] as soon as the bound is exceeded, so an oversized
    /// mergeset is never fully traversed.
    pub fn ordered_mergeset_without_selected_parent<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        selected_parent: Hash,
        parents: &[Hash],
    ) -> ConsensusResult<Vec<Hash>> {
        let mut queue: VecDeque<Hash> = parents.iter().copied().filter(|parent| *parent != selected_parent).collect();
        let mut mergeset: BlockHashSet = queue.iter().copied().collect();
        let mut selected_parent_past = BlockHashSet::new();
        self.check_mergeset_size(mergeset.len())?;

        while let Some(current) = queue.pop_front() {
            let header = reader.header(&current)?;
            for parent in header.direct_parents() {
                if mergeset.contains(parent) || selected_parent_past.contains(parent) {
                    continue;
                }
                if is_dag_ancestor_of(reader, *parent, selected_parent)? {
                    selected_parent_past.insert(*parent);
                    continue;
                }
                mergeset.insert(*parent);
                self.check_mergeset_size(mergeset.len())?;
                queue.push_back(*parent);
            }
        }

        let mut sortable = Vec::with_capacity(mergeset.len());
        for hash in mergeset {
            sortable.push(SortableBlock::new(hash, reader.ghostdag_data(&hash)?.blue_work));
        }
        sortable.sort();
        Ok(sortable.into_iter().map(|block| block.hash).collect())
    }

    fn check_mergeset_size(&self, without_selected_parent: usize) -> ConsensusResult<()> {
        let size = without_selected_parent as u64 + 1;
        if size > self.mergeset_size_limit {
            return Err(RuleError::MergesetTooBig(size, self.mergeset_size_limit).into());
        }
        Ok(())
    }

    /// Runs GHOSTDAG over `parents`. `bits` is the difficulty of the block being colored; the
    /// virtual passes `None` as it carries no work of its own.
    pub fn ghostdag<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        parents: &[Hash],
        bits: Option<u32>,
    ) -> ConsensusResult<GhostdagData> {
        let selected_parent = self.find_selected_parent(reader, parents)?;
        let mut new_block_data = GhostdagData::new_with_selected_parent(selected_parent, self.protocol.k());
        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(reader, selected_parent, parents)?;

        for candidate in ordered_mergeset {
            match self.protocol.check_blue_candidate(reader, &new_block_data, candidate)? {
                ColoringOutput::Blue(anticone_size, anticone_sizes) => {
                    new_block_data.add_blue(candidate, anticone_size, &anticone_sizes)
                }
                ColoringOutput::Red => new_block_data.add_red(candidate),
            }
        }

        let selected_parent_data = reader.ghostdag_data(&selected_parent)?;
        let blue_score = selected_parent_data.blue_score + new_block_data.mergeset_blues.len() as u64;
        // The selected parent's own work is already part of its blue work
        let mut blue_work = selected_parent_data.blue_work;
        for blue in new_block_data.mergeset_blues.iter().skip(1) {
            blue_work += calc_work(reader.header(blue)?.bits);
        }
        if let Some(bits) = bits {
            blue_work += calc_work(bits);
        }
        new_block_data.finalize_score_and_work(blue_score, blue_work);

        self.check_bounded_merge_depth(reader, &new_block_data)?;
        trace!(
            "ghostdag: selected parent {}, {} blues, {} reds, blue score {}",
            selected_parent,
            new_block_data.mergeset_blues.len(),
            new_block_data.mergeset_reds.len(),
            blue_score
        );
        Ok(new_block_data)
    }

    /// Red blocks may only be merged while they are within `merge_depth` blue score of the merging block
    fn check_bounded_merge_depth<R: ConsensusReader + ?Sized>(&self, reader: &R, data: &GhostdagData) -> ConsensusResult<()> {
        for red in data.mergeset_reds.iter() {
            let red_blue_score = reader.ghostdag_data(red)?.blue_score;
            if red_blue_score + self.merge_depth < data.blue_score {
                return Err(RuleError::ViolatingBoundedMergeDepth(*red).into());
            }
        }
        Ok(())
    }
}
