//! Pruning point proof generation and verification
//!
//! A proof holds one header chain per block level, oldest header first. The
//! level-L chain follows, from the pruning point down, the level-L parent with
//! the highest blue work, for at most `2 * M` headers or until genesis.

use consensus_core::config::constants::perf::PROOF_BATCH_SIZE;
use consensus_core::errors::{ConsensusError, ConsensusResult, RuleError};
use consensus_core::ghostdag::SortableBlock;
use consensus_core::header::Header;
use consensus_core::pow::check_pow;
use consensus_core::pruning::PruningPointProof;
use consensus_core::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::parents_builder::ParentsManager;
use crate::consensus::storage::ConsensusReader;

pub struct PruningProofManager {
    genesis_hash: Hash,
    pruning_proof_m: u64,
    max_block_level: u8,
    skip_proof_of_work: bool,
    parents_manager: Arc<ParentsManager>,
}

/// Counts processed headers and yields between batches
struct BatchCursor<'a> {
    processed: usize,
    cancel: &'a AtomicBool,
}

impl<'a> BatchCursor<'a> {
    fn new(cancel: &'a AtomicBool) -> Self {
        Self { processed: 0, cancel }
    }

    /// Returns true when a batch boundary was crossed
    fn step(&mut self) -> ConsensusResult<bool> {
        self.processed += 1;
        if self.processed % PROOF_BATCH_SIZE != 0 {
            return Ok(false);
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Err(ConsensusError::cancelled());
        }
        Ok(true)
    }
}

fn bad_proof(reason: impl Into<String>) -> ConsensusError {
    RuleError::BadPruningProof(reason.into()).into()
}

impl PruningProofManager {
    pub fn new(
        genesis_hash: Hash,
        pruning_proof_m: u64,
        max_block_level: u8,
        skip_proof_of_work: bool,
        parents_manager: Arc<ParentsManager>,
    ) -> Self {
        Self { genesis_hash, pruning_proof_m, max_block_level, skip_proof_of_work, parents_manager }
    }

    fn max_chain_len(&self) -> usize {
        2 * self.pruning_proof_m as usize
    }

    /// Builds the proof for `pruning_point`. `lock` is taken for each batch of headers and
    /// released in between, so block processing can interleave with a long generation.
    pub fn generate<R, G>(
        &self,
        reader: &R,
        pruning_point: Hash,
        cancel: &AtomicBool,
        mut lock: impl FnMut() -> G,
    ) -> ConsensusResult<PruningPointProof>
    where
        R: ConsensusReader + ?Sized,
    {
        let mut cursor = BatchCursor::new(cancel);
        let mut guard = Some(lock());
        let pruning_point_header = reader.header(&pruning_point)?;
        let pruning_point_level = self.parents_manager.block_level(&pruning_point) as usize;
        let mut proof = PruningPointProof::new();

        for level in 0..=self.max_block_level as usize {
            let start = if level == 0 || pruning_point_level >= level {
                pruning_point
            } else {
                self.best_parent_at_level(reader, &pruning_point_header, level)?
            };
            if level > 0 && start == self.genesis_hash {
                break;
            }

            let mut chain = vec![reader.header(&start)?];
            while chain.len() < self.max_chain_len() {
                let current = &chain[chain.len() - 1];
                if current.hash == self.genesis_hash {
                    break;
                }
                let next = self.best_parent_at_level(reader, current, level)?;
                chain.push(reader.header(&next)?);
                if cursor.step()? {
                    drop(guard.take());
                    guard = Some(lock());
                }
            }
            chain.reverse();
            proof.push(chain.iter().map(|header| (**header).clone()).collect());
        }

        drop(guard);
        debug!(%pruning_point, levels = proof.len(), headers = proof.iter().map(Vec::len).sum::<usize>(), "generated pruning point proof");
        Ok(proof)
    }

    fn best_parent_at_level<R: ConsensusReader + ?Sized>(&self, reader: &R, header: &Header, level: usize) -> ConsensusResult<Hash> {
        let mut best: Option<SortableBlock> = None;
        for parent in header.parents_at_level(level, &self.genesis_hash) {
            let candidate = SortableBlock::new(*parent, reader.ghostdag_data(parent)?.blue_work);
            if best.map_or(true, |current| candidate > current) {
                best = Some(candidate);
            }
        }
        best.map(|block| block.hash)
            .ok_or_else(|| ConsensusError::internal(format!("block {} has no parents at level {level}", header.hash)))
    }

    /// Checks a proof in isolation and against the claimed pruning point
    pub fn verify(&self, proof: &PruningPointProof, pruning_point: Hash, cancel: &AtomicBool) -> ConsensusResult<()> {
        let Some(level_zero) = proof.first() else {
            return Err(bad_proof("proof has no levels"));
        };
        if proof.len() > self.max_block_level as usize + 1 {
            return Err(bad_proof(format!("proof has {} levels", proof.len())));
        }
        let Some(pruning_point_header) = level_zero.last() else {
            return Err(bad_proof("level 0 is empty"));
        };
        if pruning_point_header.hash != pruning_point {
            return Err(bad_proof(format!("level 0 ends at {} instead of {pruning_point}", pruning_point_header.hash)));
        }

        let mut cursor = BatchCursor::new(cancel);
        for (level, chain) in proof.iter().enumerate() {
            self.verify_level(level, chain, pruning_point_header, &mut cursor)?;
        }
        Ok(())
    }

    fn verify_level(&self, level: usize, chain: &[Header], pruning_point_header: &Header, cursor: &mut BatchCursor) -> ConsensusResult<()> {
        let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
            return Err(bad_proof(format!("level {level} is empty")));
        };
        if chain.len() > self.max_chain_len() || (first.hash != self.genesis_hash && chain.len() != self.max_chain_len()) {
            return Err(bad_proof(format!("level {level} has {} headers and does not start at genesis", chain.len())));
        }
        if level > 0
            && last.hash != pruning_point_header.hash
            && !pruning_point_header.parents_at_level(level, &self.genesis_hash).contains(&last.hash)
        {
            return Err(bad_proof(format!("level {level} is not anchored at the pruning point")));
        }

        for (i, header) in chain.iter().enumerate() {
            let mut rehashed = header.clone();
            rehashed.finalize();
            if rehashed.hash != header.hash {
                return Err(bad_proof(format!("header {} has a wrong hash", header.hash)));
            }
            if !self.skip_proof_of_work && !check_pow(header) {
                return Err(bad_proof(format!("header {} has invalid proof of work", header.hash)));
            }
            if (self.parents_manager.block_level(&header.hash) as usize) < level {
                return Err(bad_proof(format!("header {} is below level {level}", header.hash)));
            }
            if i > 0 {
                let previous = &chain[i - 1];
                if !header.parents_at_level(level, &self.genesis_hash).contains(&previous.hash) {
                    return Err(bad_proof(format!("header {} does not link to {} at level {level}", header.hash, previous.hash)));
                }
                if header.blue_work <= previous.blue_work {
                    return Err(bad_proof(format!("blue work does not increase at header {}", header.hash)));
                }
            }
            cursor.step()?;
        }
        Ok(())
    }
}
