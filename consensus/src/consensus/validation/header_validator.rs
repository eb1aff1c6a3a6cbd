//! Header validation for consensus
//!
//! This module validates block headers including:
//! - Version, parent count and proof of work, in isolation
//! - Timestamps against the local clock and the past median time
//! - Parent existence, validity and mutual independence
//! - Every header field derived from the parents: GHOSTDAG scores, DAA score,
//!   difficulty, parents by level and pruning point

use consensus_core::blockstatus::BlockStatus;
use consensus_core::config::constants::BLOCK_VERSION;
use consensus_core::errors::{BlockProcessResult, ConsensusResult, RuleError};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::pow::check_pow;
use consensus_core::{BlockHashSet, Hash};
use std::sync::Arc;

use crate::consensus::dag::{is_dag_ancestor_of, SelectedChainIndex};
use crate::consensus::difficulty::DifficultyManager;
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::ConsensusReader;
use crate::process::parents_builder::ParentsManager;
use crate::process::past_median_time::PastMedianTimeManager;
use crate::process::pruning::PruningManager;

/// Header fields a block on top of some parents must carry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedHeaderFields {
    pub ghostdag_data: GhostdagData,
    pub daa_score: u64,
    pub bits: u32,
    pub past_median_time: u64,
    pub parents_by_level: Vec<Vec<Hash>>,
    pub pruning_point: Hash,
}

/// Header validator for consensus rules
pub struct HeaderValidator {
    max_block_parents: usize,
    max_future_block_time_offset: u64,
    skip_proof_of_work: bool,
    ghostdag_manager: Arc<GhostdagManager>,
    difficulty_manager: Arc<DifficultyManager>,
    past_median_time_manager: Arc<PastMedianTimeManager>,
    parents_manager: Arc<ParentsManager>,
    pruning_manager: Arc<PruningManager>,
}

impl HeaderValidator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_block_parents: usize,
        max_future_block_time_offset: u64,
        skip_proof_of_work: bool,
        ghostdag_manager: Arc<GhostdagManager>,
        difficulty_manager: Arc<DifficultyManager>,
        past_median_time_manager: Arc<PastMedianTimeManager>,
        parents_manager: Arc<ParentsManager>,
        pruning_manager: Arc<PruningManager>,
    ) -> Self {
        Self {
            max_block_parents,
            max_future_block_time_offset,
            skip_proof_of_work,
            ghostdag_manager,
            difficulty_manager,
            past_median_time_manager,
            parents_manager,
            pruning_manager,
        }
    }

    /// Context-free checks. `now` is the local clock in milliseconds.
    pub fn validate_header_in_isolation(&self, header: &Header, now: u64) -> BlockProcessResult<()> {
        if header.version != BLOCK_VERSION {
            return Err(RuleError::WrongBlockVersion(header.version, BLOCK_VERSION));
        }

        let direct_parents = header.direct_parents();
        if direct_parents.is_empty() {
            return Err(RuleError::NoParents);
        }
        if direct_parents.len() > self.max_block_parents {
            return Err(RuleError::TooManyParents(direct_parents.len(), self.max_block_parents));
        }
        let mut seen = BlockHashSet::with_capacity(direct_parents.len());
        for parent in direct_parents {
            if !seen.insert(*parent) {
                return Err(RuleError::DuplicateParents(*parent));
            }
        }

        if !self.skip_proof_of_work && !check_pow(header) {
            return Err(RuleError::InvalidPoW);
        }

        let max_timestamp = now.saturating_add(self.max_future_block_time_offset);
        if header.timestamp > max_timestamp {
            return Err(RuleError::TimeTooFarIntoTheFuture(header.timestamp, max_timestamp));
        }
        Ok(())
    }

    /// Parents must be known, valid, unpruned and not ancestors of each other
    pub fn check_parents_in_context<R: ConsensusReader + ?Sized>(&self, reader: &R, parents: &[Hash]) -> ConsensusResult<()> {
        let mut missing = Vec::new();
        for parent in parents {
            match reader.get_status(parent)? {
                BlockStatus::Unknown => missing.push(*parent),
                BlockStatus::Invalid => return Err(RuleError::InvalidParent(*parent).into()),
                BlockStatus::Pruned => return Err(RuleError::PrunedParent(*parent).into()),
                _ => {}
            }
        }
        if !missing.is_empty() {
            return Err(RuleError::MissingParents(missing).into());
        }

        for (i, a) in parents.iter().enumerate() {
            for b in parents.iter().skip(i + 1) {
                if is_dag_ancestor_of(reader, *a, *b)? {
                    return Err(RuleError::InvalidParentsRelation(*a, *b).into());
                }
                if is_dag_ancestor_of(reader, *b, *a)? {
                    return Err(RuleError::InvalidParentsRelation(*b, *a).into());
                }
            }
        }
        Ok(())
    }

    /// Computes every derived header field for a block with the given direct parents
    pub fn calc_expected_fields<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        chain_index: &SelectedChainIndex,
        parents: &[Hash],
    ) -> ConsensusResult<ExpectedHeaderFields> {
        let selected_parent = self.ghostdag_manager.find_selected_parent(reader, parents)?;
        let bits = self.difficulty_manager.calculate_difficulty_bits(reader, selected_parent)?;
        let ghostdag_data = self.ghostdag_manager.ghostdag(reader, parents, Some(bits))?;
        let daa_score = self.difficulty_manager.calc_daa_score(reader, &ghostdag_data)?;
        let past_median_time = self.past_median_time_manager.calc_past_median_time(reader, selected_parent)?;
        let parents_by_level = self.parents_manager.calc_block_parents(reader, parents)?;
        let pruning_point = self.pruning_manager.expected_pruning_point(reader, chain_index, &ghostdag_data)?;
        Ok(ExpectedHeaderFields { ghostdag_data, daa_score, bits, past_median_time, parents_by_level, pruning_point })
    }

    /// Full contextual header validation. Returns the expected fields, whose GHOSTDAG data is
    /// the data to store for the block.
    pub fn validate_header_in_context<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        chain_index: &SelectedChainIndex,
        header: &Header,
    ) -> ConsensusResult<ExpectedHeaderFields> {
        self.check_parents_in_context(reader, header.direct_parents())?;
        let expected = self.calc_expected_fields(reader, chain_index, header.direct_parents())?;

        if header.bits != expected.bits {
            return Err(RuleError::UnexpectedDifficulty(header.bits, expected.bits).into());
        }
        if header.blue_score != expected.ghostdag_data.blue_score {
            return Err(RuleError::UnexpectedBlueScore(header.blue_score, expected.ghostdag_data.blue_score).into());
        }
        if header.blue_work != expected.ghostdag_data.blue_work {
            return Err(RuleError::UnexpectedBlueWork(header.blue_work, expected.ghostdag_data.blue_work).into());
        }
        if header.daa_score != expected.daa_score {
            return Err(RuleError::UnexpectedDaaScore(header.daa_score, expected.daa_score).into());
        }
        if header.timestamp <= expected.past_median_time {
            return Err(RuleError::TimeTooOld(header.timestamp, expected.past_median_time).into());
        }
        if header.parents_by_level != expected.parents_by_level {
            return Err(RuleError::UnexpectedParentsByLevel.into());
        }
        if header.pruning_point != expected.pruning_point {
            return Err(RuleError::WrongPruningPoint(header.pruning_point, expected.pruning_point).into());
        }
        Ok(expected)
    }
}
