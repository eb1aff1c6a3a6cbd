//! Block processor for consensus
//!
//! Runs the contextual part of block processing inside the serialized section:
//! header validation in context, coinbase checks, storage of the block and the
//! virtual resolution it triggers. Everything is staged as one batch that the
//! caller commits, or discarded as a whole when the block is rejected.

use consensus_core::block::{Block, BlockBody};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult, RuleError};
use database::stores::metadata_store::KEY_VIRTUAL_STATE;
use std::sync::Arc;
use tracing::{debug, warn};

use super::virtual_processor::{VirtualProcessor, VirtualUpdate};
use super::virtual_state::VirtualState;
use crate::consensus::dag::{calc_height, update_tips, SelectedChainIndex};
use crate::consensus::storage::{ConsensusReader, ConsensusStorage, StagingArea};
use crate::consensus::validation::HeaderValidator;
use crate::process::coinbase::CoinbaseManager;

/// A block that made it into the DAG, with every write it causes staged but not committed
pub struct StagedBlock<'a> {
    pub staging: StagingArea<'a>,
    pub status: BlockStatus,
    pub update: VirtualUpdate,
}

/// Block processor for consensus
pub struct BlockProcessor {
    header_validator: Arc<HeaderValidator>,
    coinbase_manager: Arc<CoinbaseManager>,
    virtual_processor: Arc<VirtualProcessor>,
}

impl BlockProcessor {
    pub fn new(
        header_validator: Arc<HeaderValidator>,
        coinbase_manager: Arc<CoinbaseManager>,
        virtual_processor: Arc<VirtualProcessor>,
    ) -> Self {
        Self { header_validator, coinbase_manager, virtual_processor }
    }

    /// Processes a block that passed the isolation checks and is not yet known. A block whose
    /// UTXO state fails its commitments is kept, disqualified from the chain. On a header or
    /// coinbase rule violation nothing but the `Invalid` status of the block is persisted, and
    /// only for errors that are properties of the block itself.
    pub fn process_block<'a>(
        &self,
        storage: &'a ConsensusStorage,
        chain_index: &SelectedChainIndex,
        virtual_state: &VirtualState,
        block: &Block,
    ) -> ConsensusResult<StagedBlock<'a>> {
        let hash = block.hash();
        let mut staging = StagingArea::new(storage);
        match self.stage_block(&mut staging, chain_index, virtual_state, block) {
            Ok(update) => {
                let status = staging.get_status(&hash)?;
                debug!("staged block {} with {} writes, status {:?}", hash, staging.len(), status);
                Ok(StagedBlock { staging, status, update })
            }
            Err(ConsensusError::Rule(err)) => {
                drop(staging);
                warn!("block {} rejected: {}", hash, err);
                if err.caches_invalid_status() {
                    let mut staging = StagingArea::new(storage);
                    staging.stage_status(hash, BlockStatus::Invalid)?;
                    staging.commit()?;
                }
                Err(err.into())
            }
            Err(err) => Err(err),
        }
    }

    fn stage_block(
        &self,
        staging: &mut StagingArea,
        chain_index: &SelectedChainIndex,
        virtual_state: &VirtualState,
        block: &Block,
    ) -> ConsensusResult<VirtualUpdate> {
        let header = &block.header;
        let hash = header.hash;
        let expected = self.header_validator.validate_header_in_context(&*staging, chain_index, header)?;

        let coinbase = block.transactions.first().ok_or(RuleError::NoTransactions)?;
        self.coinbase_manager.validate_coinbase_in_context(coinbase, hash, header.blue_score, header.daa_score)?;

        let height = calc_height(&*staging, header.direct_parents())?;
        staging.stage_header(Arc::new(header.clone()))?;
        staging.stage_body(hash, Arc::new(BlockBody { transactions: block.transactions.clone() }))?;
        staging.stage_ghostdag_data(hash, Arc::new(expected.ghostdag_data))?;
        staging.stage_height(hash, height)?;
        staging.stage_status(hash, BlockStatus::Pending)?;

        let mut base = virtual_state.clone();
        update_tips(&mut base.tips, hash, header.direct_parents());
        base.header_count += 1;
        base.block_count += 1;

        let update = self.virtual_processor.resolve_virtual(staging, chain_index, &base)?;
        staging.stage_metadata(KEY_VIRTUAL_STATE, &update.state)?;
        Ok(update)
    }
}
