//! Virtual processor for consensus
//!
//! Resolves the virtual block after the DAG changes: picks the sink among the
//! chain-eligible blocks, moves the UTXO state along the selected chain
//! (disconnecting and connecting chain blocks on a reorg), chooses the virtual
//! parents and recomputes the virtual's derived fields.

use consensus_core::acceptance_data::{accepted_transaction_ids, AcceptanceData, MergesetBlockAcceptanceData};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult, RuleError, TxResult};
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::merkle::calc_accepted_id_merkle_root;
use consensus_core::muhash::MuHashExtensions;
use consensus_core::pruning::PruningPointInfo;
use consensus_core::tx::{Transaction, TransactionId, UtxoEntry};
use consensus_core::utxo::{ComposedUtxoView, UtxoDiff, UtxoView};
use consensus_core::{BlockHashSet, Hash};
use std::collections::BinaryHeap;
use std::sync::Arc;
use stokes_muhash::MuHash;
use tracing::{debug, trace, warn};

use super::virtual_state::VirtualState;
use crate::consensus::dag::SelectedChainIndex;
use crate::consensus::difficulty::DifficultyManager;
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::{ConsensusReader, StagingArea, UtxoStateCursor};
use crate::consensus::validation::{PopulatedTransaction, TransactionValidator};
use crate::process::past_median_time::PastMedianTimeManager;
use crate::process::pruning::PruningManager;

/// Route from the current selected chain to some chain-eligible block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainPath {
    /// Highest block shared with the current selected chain
    pub common: Hash,
    /// Blocks to connect above `common`, ascending
    pub to_connect: Vec<Hash>,
}

/// Outcome of resolving the virtual
#[derive(Clone, Debug)]
pub struct VirtualUpdate {
    pub state: VirtualState,
    /// Chain blocks that left the selected chain, from the old sink downwards
    pub removed_chain_blocks: Vec<Hash>,
    /// Chain blocks that joined the selected chain with their blue scores, ascending
    pub added_chain_blocks: Vec<(u64, Hash)>,
    /// Blue score of the highest block shared by the old and the new chain
    pub fork_blue_score: u64,
    /// Transactions accepted by the added chain blocks
    pub accepted_transaction_ids: Vec<TransactionId>,
    pub pruning_point_advanced: bool,
}

impl VirtualUpdate {
    pub fn chain_changed(&self) -> bool {
        !self.removed_chain_blocks.is_empty() || !self.added_chain_blocks.is_empty()
    }

    pub fn added_hashes(&self) -> Vec<Hash> {
        self.added_chain_blocks.iter().map(|(_, hash)| *hash).collect()
    }
}

/// Virtual processor for virtual state calculation
pub struct VirtualProcessor {
    max_block_parents: usize,
    ghostdag_manager: Arc<GhostdagManager>,
    difficulty_manager: Arc<DifficultyManager>,
    past_median_time_manager: Arc<PastMedianTimeManager>,
    pruning_manager: Arc<PruningManager>,
    transaction_validator: Arc<TransactionValidator>,
}

impl VirtualProcessor {
    pub fn new(
        max_block_parents: usize,
        ghostdag_manager: Arc<GhostdagManager>,
        difficulty_manager: Arc<DifficultyManager>,
        past_median_time_manager: Arc<PastMedianTimeManager>,
        pruning_manager: Arc<PruningManager>,
        transaction_validator: Arc<TransactionValidator>,
    ) -> Self {
        Self {
            max_block_parents,
            ghostdag_manager,
            difficulty_manager,
            past_median_time_manager,
            pruning_manager,
            transaction_validator,
        }
    }

    /// UTXO diff and acceptance data of a chain block with `ghostdag_data` and transactions `own_txs`,
    /// evaluated over `base`, the UTXO set of its selected parent.
    ///
    /// Mergeset blocks are visited in consensus order. Their transactions are accepted when valid in
    /// the accumulated context and silently skipped otherwise; coinbases of red blocks are never
    /// credited. The chain block's own transactions must all be valid.
    pub fn calculate_utxo_diff<R, V>(
        &self,
        reader: &R,
        ghostdag_data: &GhostdagData,
        daa_score: u64,
        chain_block: Hash,
        own_txs: &[Transaction],
        base: &V,
    ) -> ConsensusResult<(UtxoDiff, AcceptanceData)>
    where
        R: ConsensusReader + ?Sized,
        V: UtxoView + ?Sized,
    {
        let mut diff = UtxoDiff::default();
        let mut acceptance_data = AcceptanceData::new();

        for merged in ghostdag_data.consensus_ordered_mergeset_without_selected_parent() {
            let body = reader.body(&merged)?;
            let is_blue = ghostdag_data.is_blue(&merged);
            let mut accepted_transactions = Vec::new();
            for tx in body.transactions.iter() {
                if tx.is_coinbase() && !is_blue {
                    continue;
                }
                match self.validate_in_context(tx, base, &diff, daa_score)? {
                    Ok(spent) => {
                        diff.add_transaction(tx, &spent, daa_score);
                        accepted_transactions.push(tx.id());
                    }
                    Err(err) => trace!("transaction {} of merged block {} rejected: {}", tx.id(), merged, err),
                }
            }
            acceptance_data.push(MergesetBlockAcceptanceData { block_hash: merged, accepted_transactions });
        }

        let mut accepted_transactions = Vec::with_capacity(own_txs.len());
        for tx in own_txs {
            let spent = self
                .validate_in_context(tx, base, &diff, daa_score)?
                .map_err(|err| RuleError::InvalidTransactionsInUtxoContext(tx.id(), err))?;
            diff.add_transaction(tx, &spent, daa_score);
            accepted_transactions.push(tx.id());
        }
        acceptance_data.push(MergesetBlockAcceptanceData { block_hash: chain_block, accepted_transactions });

        Ok((diff, acceptance_data))
    }

    fn validate_in_context<V: UtxoView + ?Sized>(
        &self,
        tx: &Transaction,
        base: &V,
        diff: &UtxoDiff,
        daa_score: u64,
    ) -> ConsensusResult<TxResult<Vec<UtxoEntry>>> {
        let view = ComposedUtxoView::new(base, diff);
        let populated = PopulatedTransaction::populate(tx, &view)?;
        Ok(self.transaction_validator.validate_populated_transaction(&populated, daa_score))
    }

    /// Walks selected parents from `target` down to the first `Active` block. Returns `None` when the
    /// walk meets a block that may not be on the chain, or when the shared block sits below the
    /// pruning point.
    pub fn find_chain_path<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        target: Hash,
        pruning_point_blue_score: u64,
    ) -> ConsensusResult<Option<ChainPath>> {
        let mut to_connect = Vec::new();
        let mut current = target;
        loop {
            match reader.get_status(&current)? {
                BlockStatus::Active => break,
                BlockStatus::Pending | BlockStatus::Superseded => {
                    to_connect.push(current);
                    current = reader.ghostdag_data(&current)?.selected_parent;
                }
                _ => return Ok(None),
            }
        }
        if reader.ghostdag_data(&current)?.blue_score < pruning_point_blue_score {
            return Ok(None);
        }
        to_connect.reverse();
        Ok(Some(ChainPath { common: current, to_connect }))
    }

    /// Moves `cursor` from `sink` down to `common`, returning the disconnected blocks
    fn disconnect_to<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        cursor: &mut UtxoStateCursor,
        sink: Hash,
        common: Hash,
    ) -> ConsensusResult<Vec<Hash>> {
        let mut disconnected = Vec::new();
        let mut current = sink;
        while current != common {
            let diff = reader
                .get_utxo_diff(&current)?
                .ok_or_else(|| ConsensusError::internal(format!("chain block {current} has no utxo diff")))?;
            cursor.apply(&diff.reversed());
            disconnected.push(current);
            current = reader.ghostdag_data(&current)?.selected_parent;
        }
        Ok(disconnected)
    }

    /// Connects `blocks` in order on top of `cursor`. Diffs already stored are reused; new ones are
    /// computed, checked against the header commitments and staged. Returns the first block that
    /// failed together with its rule violation.
    fn connect_chain(
        &self,
        staging: &mut StagingArea,
        cursor: &mut UtxoStateCursor,
        blocks: &[Hash],
    ) -> ConsensusResult<Option<(Hash, RuleError)>> {
        let committed_utxo_set = &staging.storage().utxo_set;
        for hash in blocks.iter().copied() {
            if let Some(diff) = staging.get_utxo_diff(&hash)? {
                cursor.apply(&diff);
                continue;
            }

            let header = staging.header(&hash)?;
            let body = staging.body(&hash)?;
            let ghostdag_data = staging.ghostdag_data(&hash)?;
            let calculated = {
                let base = cursor.view(committed_utxo_set);
                self.calculate_utxo_diff(&*staging, &ghostdag_data, header.daa_score, hash, &body.transactions, &base)
            };
            let (diff, acceptance_data) = match calculated {
                Ok(calculated) => calculated,
                Err(ConsensusError::Rule(err)) => return Ok(Some((hash, err))),
                Err(err) => return Err(err),
            };

            let mut multiset = cursor.multiset();
            multiset.add_utxo_diff(&diff);
            let commitment = multiset.finalize();
            if commitment != header.utxo_commitment {
                return Ok(Some((hash, RuleError::BadUtxoCommitment(hash, header.utxo_commitment, commitment))));
            }
            let accepted_ids: Vec<TransactionId> = accepted_transaction_ids(&acceptance_data).collect();
            let accepted_id_merkle_root = calc_accepted_id_merkle_root(&accepted_ids);
            if accepted_id_merkle_root != header.accepted_id_merkle_root {
                return Ok(Some((
                    hash,
                    RuleError::BadAcceptedIdMerkleRoot(hash, header.accepted_id_merkle_root, accepted_id_merkle_root),
                )));
            }

            cursor.apply(&diff);
            staging.stage_utxo_diff(hash, Arc::new(diff))?;
            staging.stage_acceptance_data(hash, Arc::new(acceptance_data))?;
        }
        Ok(None)
    }

    /// Resolves the virtual over `base`, the previous state carrying the updated tips and counts.
    ///
    /// Candidates are popped by blue work until the previous sink comes up or a candidate's chain
    /// connects cleanly. A failing chain block is marked [`BlockStatus::DisqualifiedFromChain`] and its
    /// selected parent takes its place in the queue. The block that just arrived gets no special
    /// treatment, so the outcome does not depend on the order blocks arrive in.
    pub fn resolve_virtual(
        &self,
        staging: &mut StagingArea,
        chain_index: &SelectedChainIndex,
        base: &VirtualState,
    ) -> ConsensusResult<VirtualUpdate> {
        let prev_sink = base.sink();
        let pruning_point_blue_score = base.pruning_point.blue_score;

        let mut candidates = BinaryHeap::new();
        candidates.push(SortableBlock::new(prev_sink, staging.ghostdag_data(&prev_sink)?.blue_work));
        for tip in base.tips.iter() {
            if *tip != prev_sink && staging.get_status(tip)?.is_chain_eligible() {
                candidates.push(SortableBlock::new(*tip, staging.ghostdag_data(tip)?.blue_work));
            }
        }

        let mut visited = BlockHashSet::new();
        let mut resolved = None;
        while let Some(candidate) = candidates.pop() {
            if candidate.hash == prev_sink {
                break;
            }
            if !visited.insert(candidate.hash) {
                continue;
            }
            let Some(path) = self.find_chain_path(&*staging, candidate.hash, pruning_point_blue_score)? else {
                trace!("candidate {} has no chain path above the pruning point", candidate.hash);
                continue;
            };

            let mut cursor = UtxoStateCursor::new(base.multiset);
            let disconnected = self.disconnect_to(&*staging, &mut cursor, prev_sink, path.common)?;
            match self.connect_chain(staging, &mut cursor, &path.to_connect)? {
                None => {
                    resolved = Some((candidate.hash, path, disconnected, cursor));
                    break;
                }
                Some((failed, err)) => {
                    warn!("chain block {} disqualified from the selected chain: {}", failed, err);
                    staging.stage_status(failed, BlockStatus::DisqualifiedFromChain)?;
                    let selected_parent = staging.ghostdag_data(&failed)?.selected_parent;
                    if staging.get_status(&selected_parent)?.is_chain_eligible() {
                        candidates.push(SortableBlock::new(selected_parent, staging.ghostdag_data(&selected_parent)?.blue_work));
                    }
                }
            }
        }

        let Some((sink, path, removed_chain_blocks, cursor)) = resolved else {
            let (state, pruning_point_advanced) =
                self.build_virtual_state(&*staging, chain_index, base, prev_sink, base.multiset)?;
            let fork_blue_score = staging.ghostdag_data(&prev_sink)?.blue_score;
            return Ok(VirtualUpdate {
                state,
                removed_chain_blocks: Vec::new(),
                added_chain_blocks: Vec::new(),
                fork_blue_score,
                accepted_transaction_ids: Vec::new(),
                pruning_point_advanced,
            });
        };

        for hash in removed_chain_blocks.iter() {
            staging.stage_status(*hash, BlockStatus::Superseded)?;
        }
        let mut added_chain_blocks = Vec::with_capacity(path.to_connect.len());
        let mut accepted = Vec::new();
        for hash in path.to_connect.iter() {
            staging.stage_status(*hash, BlockStatus::Active)?;
            added_chain_blocks.push((staging.ghostdag_data(hash)?.blue_score, *hash));
            if let Some(acceptance_data) = staging.get_acceptance_data(hash)? {
                accepted.extend(accepted_transaction_ids(&acceptance_data));
            }
        }
        staging.stage_virtual_utxo_diff(cursor.diff())?;

        if !removed_chain_blocks.is_empty() {
            debug!(
                "reorg: {} chain blocks removed, {} added, new sink {}",
                removed_chain_blocks.len(),
                added_chain_blocks.len(),
                sink
            );
        }

        let (state, pruning_point_advanced) =
            self.build_virtual_state(&*staging, chain_index, base, sink, cursor.multiset())?;
        Ok(VirtualUpdate {
            state,
            removed_chain_blocks,
            added_chain_blocks,
            fork_blue_score: staging.ghostdag_data(&path.common)?.blue_score,
            accepted_transaction_ids: accepted,
            pruning_point_advanced,
        })
    }

    /// Derives the virtual fields for `sink`, keeping tips and counts from `base`. The pruning point
    /// only moves forward. Returns the state and whether the pruning point advanced.
    pub fn build_virtual_state<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        chain_index: &SelectedChainIndex,
        base: &VirtualState,
        sink: Hash,
        multiset: MuHash,
    ) -> ConsensusResult<(VirtualState, bool)> {
        let (parents, ghostdag_data) = self.pick_virtual_parents(reader, sink, &base.tips)?;
        let daa_score = self.difficulty_manager.calc_daa_score(reader, &ghostdag_data)?;
        let bits = self.difficulty_manager.calculate_difficulty_bits(reader, sink)?;
        let past_median_time = self.past_median_time_manager.calc_past_median_time(reader, sink)?;

        let mut pruning_point = base.pruning_point;
        let candidate = self.pruning_manager.expected_pruning_point(reader, chain_index, &ghostdag_data)?;
        let candidate_blue_score = reader.ghostdag_data(&candidate)?.blue_score;
        let advanced = candidate_blue_score > pruning_point.blue_score;
        if advanced {
            debug!("pruning point advanced to {} at blue score {}", candidate, candidate_blue_score);
            pruning_point = PruningPointInfo {
                pruning_point: candidate,
                blue_score: candidate_blue_score,
                history_pruned_up_to: pruning_point.history_pruned_up_to,
            };
        }

        let state = VirtualState {
            parents,
            ghostdag_data,
            daa_score,
            bits,
            past_median_time,
            multiset,
            tips: base.tips.clone(),
            pruning_point,
            header_count: base.header_count,
            block_count: base.block_count,
        };
        Ok((state, advanced))
    }

    /// The sink plus the heaviest tips below it that still fit the mergeset bounds. Tips are
    /// dropped lightest first until GHOSTDAG accepts the set.
    fn pick_virtual_parents<R: ConsensusReader + ?Sized>(
        &self,
        reader: &R,
        sink: Hash,
        tips: &[Hash],
    ) -> ConsensusResult<(Vec<Hash>, GhostdagData)> {
        let sink_block = SortableBlock::new(sink, reader.ghostdag_data(&sink)?.blue_work);
        let mut candidates = Vec::new();
        for tip in tips.iter().filter(|tip| **tip != sink) {
            if reader.get_status(tip)? == BlockStatus::DisqualifiedFromChain {
                continue;
            }
            let block = SortableBlock::new(*tip, reader.ghostdag_data(tip)?.blue_work);
            if block < sink_block {
                candidates.push(block);
            }
        }
        candidates.sort_by(|a, b| b.cmp(a));
        candidates.truncate(self.max_block_parents.saturating_sub(1));

        loop {
            let parents: Vec<Hash> = std::iter::once(sink).chain(candidates.iter().map(|block| block.hash)).collect();
            match self.ghostdag_manager.ghostdag(reader, &parents, None) {
                Ok(ghostdag_data) => return Ok((parents, ghostdag_data)),
                Err(ConsensusError::Rule(RuleError::MergesetTooBig(..) | RuleError::ViolatingBoundedMergeDepth(_)))
                    if !candidates.is_empty() =>
                {
                    let dropped = candidates.pop();
                    trace!("dropping virtual parent candidate {:?}", dropped.map(|block| block.hash));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The UTXO state right after `block`, which must be chain-eligible. Every chain block on the
    /// way is connected in `staging`, so callers pass a staging area they intend to drop.
    pub fn utxo_state_after(
        &self,
        staging: &mut StagingArea,
        state: &VirtualState,
        block: Hash,
    ) -> ConsensusResult<UtxoStateCursor> {
        let path = self
            .find_chain_path(&*staging, block, state.pruning_point.blue_score)?
            .ok_or_else(|| ConsensusError::internal(format!("block {block} cannot be on the selected chain")))?;
        let mut cursor = UtxoStateCursor::new(state.multiset);
        self.disconnect_to(&*staging, &mut cursor, state.sink(), path.common)?;
        if let Some((_, err)) = self.connect_chain(staging, &mut cursor, &path.to_connect)? {
            return Err(err.into());
        }
        Ok(cursor)
    }
}
