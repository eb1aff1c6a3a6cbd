//! The k-cluster coloring rule
//!
//! A mergeset candidate is blue when, in the context of the new block, its
//! blue anticone holds at most `k` blocks and adding it keeps every existing
//! blue's anticone within `k`. The check walks the new block's selected chain,
//! visiting the blues each chain block merged, and stops as soon as the chain
//! block is an ancestor of the candidate.

use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::{BlockHashMap, Hash, KType, ZERO_HASH};

use crate::consensus::dag::is_dag_ancestor_of;
use crate::consensus::storage::ConsensusReader;

#[derive(Debug, PartialEq, Eq)]
pub enum ColoringOutput {
    /// Blue anticone size of the candidate and the anticone sizes of the blues in its anticone
    Blue(KType, BlockHashMap<KType>),
    Red,
}

enum ColoringState {
    Blue,
    Red,
    Pending,
}

pub struct GhostdagProtocol {
    k: KType,
}

impl GhostdagProtocol {
    pub fn new(k: KType) -> Self {
        Self { k }
    }

    pub fn k(&self) -> KType {
        self.k
    }

    /// Colors `candidate` given the partially built data of the new block
    pub fn check_blue_candidate<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        new_block_data: &GhostdagData,
        candidate: Hash,
    ) -> ConsensusResult<ColoringOutput> {
        // The selected parent is blue, so k + 1 blues means the anticone bound is reached
        if new_block_data.mergeset_blues.len() as u64 == self.k as u64 + 1 {
            return Ok(ColoringOutput::Red);
        }

        let mut anticone_sizes = BlockHashMap::with_capacity(self.k as usize);
        let mut anticone_size: KType = 0;

        // The new block is the first chain block. It has no hash yet and is never an ancestor of the candidate.
        match self.check_with_chain_block(reader, new_block_data, None, new_block_data, candidate, &mut anticone_sizes, &mut anticone_size)? {
            ColoringState::Blue => return Ok(ColoringOutput::Blue(anticone_size, anticone_sizes)),
            ColoringState::Red => return Ok(ColoringOutput::Red),
            ColoringState::Pending => {}
        }

        let mut chain_block = new_block_data.selected_parent;
        loop {
            if chain_block == ZERO_HASH {
                return Err(ConsensusError::internal(format!("candidate {candidate} is not in the future of genesis")));
            }
            let chain_data = reader.ghostdag_data(&chain_block)?;
            match self.check_with_chain_block(
                reader,
                new_block_data,
                Some(chain_block),
                &chain_data,
                candidate,
                &mut anticone_sizes,
                &mut anticone_size,
            )? {
                ColoringState::Blue => return Ok(ColoringOutput::Blue(anticone_size, anticone_sizes)),
                ColoringState::Red => return Ok(ColoringOutput::Red),
                ColoringState::Pending => chain_block = chain_data.selected_parent,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_with_chain_block<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        new_block_data: &GhostdagData,
        chain_block: Option<Hash>,
        chain_data: &GhostdagData,
        candidate: Hash,
        anticone_sizes: &mut BlockHashMap<KType>,
        anticone_size: &mut KType,
    ) -> ConsensusResult<ColoringState> {
        // Every blue below a chain block in the past of the candidate is also in its past
        if let Some(hash) = chain_block {
            if is_dag_ancestor_of(reader, hash, candidate)? {
                return Ok(ColoringState::Blue);
            }
        }

        for &blue in chain_data.mergeset_blues.iter() {
            if is_dag_ancestor_of(reader, blue, candidate)? {
                continue;
            }
            let blue_anticone_size = self.blue_anticone_size(reader, blue, new_block_data)?;
            anticone_sizes.insert(blue, blue_anticone_size);

            *anticone_size += 1;
            if *anticone_size > self.k {
                return Ok(ColoringState::Red);
            }
            if blue_anticone_size == self.k {
                return Ok(ColoringState::Red);
            }
            if blue_anticone_size > self.k {
                return Err(ConsensusError::internal(format!("blue block {blue} has a blue anticone larger than k")));
            }
        }
        Ok(ColoringState::Pending)
    }

    /// Anticone size of `blue` within the context of `context`, found on the first chain block that recorded it
    fn blue_anticone_size<R: ConsensusReader + ?Sized>(&self, reader: &R, blue: Hash, context: &GhostdagData) -> ConsensusResult<KType> {
        if let Some(size) = context.blues_anticone_sizes.get(&blue) {
            return Ok(*size);
        }
        let mut current = context.selected_parent;
        while current != ZERO_HASH {
            let data = reader.ghostdag_data(&current)?;
            if let Some(size) = data.blues_anticone_sizes.get(&blue) {
                return Ok(*size);
            }
            current = data.selected_parent;
        }
        Err(ConsensusError::internal(format!("block {blue} is not in the blue set of the given context")))
    }
}
