//! Block template building
//!
//! Builds blocks whose every derived field (GHOSTDAG scores, DAA score,
//! difficulty, parents by level, pruning point and both UTXO commitments)
//! matches what validation will expect. Nothing is committed: the UTXO state
//! of the selected parent is reconstructed in a staging area that is dropped.

use consensus_core::acceptance_data::accepted_transaction_ids;
use consensus_core::block::{Block, BlockTemplate};
use consensus_core::coinbase::MinerData;
use consensus_core::config::constants::BLOCK_VERSION;
use consensus_core::errors::ConsensusResult;
use consensus_core::header::Header;
use consensus_core::merkle::{calc_accepted_id_merkle_root, calc_hash_merkle_root};
use consensus_core::muhash::MuHashExtensions;
use consensus_core::time::unix_now;
use consensus_core::tx::{Transaction, TransactionId};
use consensus_core::{Hash, ZERO_HASH};
use std::sync::Arc;
use tracing::debug;

use crate::consensus::dag::SelectedChainIndex;
use crate::consensus::storage::{ConsensusStorage, StagingArea};
use crate::consensus::validation::HeaderValidator;
use crate::pipeline::virtual_processor::VirtualProcessor;
use crate::pipeline::virtual_state::VirtualState;
use crate::process::coinbase::CoinbaseManager;

/// Block template builder for miners and tests
pub struct BlockTemplateBuilder {
    header_validator: Arc<HeaderValidator>,
    coinbase_manager: Arc<CoinbaseManager>,
    virtual_processor: Arc<VirtualProcessor>,
}

impl BlockTemplateBuilder {
    pub fn new(
        header_validator: Arc<HeaderValidator>,
        coinbase_manager: Arc<CoinbaseManager>,
        virtual_processor: Arc<VirtualProcessor>,
    ) -> Self {
        Self { header_validator, coinbase_manager, virtual_processor }
    }

    /// A template over the current virtual parents
    pub fn build_template(
        &self,
        storage: &ConsensusStorage,
        chain_index: &SelectedChainIndex,
        virtual_state: &VirtualState,
        miner_data: MinerData,
        txs: Vec<Transaction>,
    ) -> ConsensusResult<BlockTemplate> {
        let parents = virtual_state.parents.clone();
        let block = self.build_block(storage, chain_index, virtual_state, parents, miner_data, txs, None)?;
        let selected_parent_hash = virtual_state.sink();
        let subsidy = self.coinbase_manager.calc_subsidy_at(block.header.daa_score);
        Ok(BlockTemplate { block, selected_parent_hash, subsidy })
    }

    /// A block over arbitrary known parents. `timestamp` defaults to the local clock, raised above
    /// the past median time when needed. The nonce is left at zero.
    #[allow(clippy::too_many_arguments)]
    pub fn build_block(
        &self,
        storage: &ConsensusStorage,
        chain_index: &SelectedChainIndex,
        virtual_state: &VirtualState,
        parents: Vec<Hash>,
        miner_data: MinerData,
        txs: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block> {
        let mut staging = StagingArea::new(storage);
        self.header_validator.check_parents_in_context(&staging, &parents)?;
        let expected = self.header_validator.calc_expected_fields(&staging, chain_index, &parents)?;
        let timestamp = timestamp.unwrap_or_else(|| unix_now().max(expected.past_median_time + 1));

        let ghostdag_data = &expected.ghostdag_data;
        let subsidy = self.coinbase_manager.calc_subsidy_at(expected.daa_score);
        let coinbase = self.coinbase_manager.build_coinbase_transaction(ghostdag_data.blue_score, subsidy, miner_data)?;
        let transactions: Vec<Transaction> = std::iter::once(coinbase).chain(txs).collect();

        let cursor = self.virtual_processor.utxo_state_after(&mut staging, virtual_state, ghostdag_data.selected_parent)?;
        let (diff, acceptance_data) = {
            let base = cursor.view(&storage.utxo_set);
            self.virtual_processor.calculate_utxo_diff(&staging, ghostdag_data, expected.daa_score, ZERO_HASH, &transactions, &base)?
        };

        let mut multiset = cursor.multiset();
        multiset.add_utxo_diff(&diff);
        let accepted_ids: Vec<TransactionId> = accepted_transaction_ids(&acceptance_data).collect();

        let header = Header::new_finalized(
            BLOCK_VERSION,
            expected.parents_by_level,
            calc_hash_merkle_root(transactions.iter()),
            calc_accepted_id_merkle_root(&accepted_ids),
            multiset.finalize(),
            timestamp,
            expected.bits,
            0,
            expected.daa_score,
            ghostdag_data.blue_work,
            ghostdag_data.blue_score,
            expected.pruning_point,
        );
        debug!(
            "built block {} over {} parents: blue score {}, daa score {}, {} transactions",
            header.hash,
            parents.len(),
            header.blue_score,
            header.daa_score,
            transactions.len()
        );
        Ok(Block::new(header, transactions))
    }
}
