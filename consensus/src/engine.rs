//! The consensus engine facade
//!
//! [`Consensus`] owns the stores, the managers and the in-memory snapshot of
//! the virtual state. Every mutation runs under one processing lock, which
//! also guards the index of the selected chain. Readers use the snapshot and
//! never take that lock.

use consensus_core::acceptance_data::MergesetBlockAcceptanceData;
use consensus_core::api::notifications::Notification;
use consensus_core::api::{ConsensusApi, SyncInfo};
use consensus_core::block::{Block, BlockBody, BlockTemplate};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::coinbase::MinerData;
use consensus_core::config::Config;
use consensus_core::errors::{BlockProcessResult, ConsensusError, ConsensusResult, RuleError};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::mass::MassCalculator;
use consensus_core::muhash::EMPTY_MUHASH;
use consensus_core::pow::calc_work;
use consensus_core::pruning::{PruningPointInfo, PruningPointProof};
use consensus_core::time::unix_now;
use consensus_core::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use database::stores::metadata_store::KEY_VIRTUAL_STATE;
use database::Database;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::consensus::dag::SelectedChainIndex;
use crate::consensus::difficulty::DifficultyManager;
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::{ConsensusReader, ConsensusStorage, StagingArea};
use crate::consensus::validation::{BlockValidator, HeaderValidator, TransactionValidator};
use crate::pipeline::block_processor::{BlockProcessor, StagedBlock};
use crate::pipeline::virtual_processor::{VirtualProcessor, VirtualUpdate};
use crate::pipeline::virtual_state::VirtualState;
use crate::process::coinbase::CoinbaseManager;
use crate::process::mining::BlockTemplateBuilder;
use crate::process::parents_builder::ParentsManager;
use crate::process::past_median_time::PastMedianTimeManager;
use crate::process::pruning::PruningManager;
use crate::process::pruning_proof::PruningProofManager;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 1024;

/// Blocks still to prune below `pruning_point`, in pruning order
struct PruningCursor {
    pruning_point: Hash,
    prunable: Vec<Hash>,
    next: usize,
}

pub struct Consensus {
    config: Arc<Config>,
    storage: Arc<ConsensusStorage>,
    block_validator: BlockValidator,
    block_processor: BlockProcessor,
    template_builder: BlockTemplateBuilder,
    coinbase_manager: Arc<CoinbaseManager>,
    pruning_manager: Arc<PruningManager>,
    pruning_proof_manager: PruningProofManager,
    /// The processing lock. Guards the selected chain index of the committed sink.
    processing: Mutex<SelectedChainIndex>,
    /// The virtual state snapshot. Swapped under its write guard together with the store commit.
    virtual_state: RwLock<Arc<VirtualState>>,
    pruning_cursor: Mutex<Option<PruningCursor>>,
    notifier: broadcast::Sender<Notification>,
}

impl Consensus {
    /// Opens consensus over `db`. An empty store is initialized with the genesis block, otherwise
    /// the persisted virtual state is loaded and the virtual resolved again.
    pub fn init(config: Config, db: Arc<Database>) -> ConsensusResult<Self> {
        let config = Arc::new(config);
        let params = &config.params;
        let genesis_hash = params.genesis.hash();

        let ghostdag_manager =
            Arc::new(GhostdagManager::new(genesis_hash, params.ghostdag_k, params.mergeset_size_limit, params.merge_depth));
        let difficulty_manager = Arc::new(DifficultyManager::new(
            params.genesis.bits,
            params.max_difficulty_bits,
            params.target_time_per_block,
            params.difficulty_adjustment_window_size,
        ));
        let past_median_time_manager = Arc::new(PastMedianTimeManager::new(params.past_median_time_window_size()));
        let parents_manager = Arc::new(ParentsManager::new(genesis_hash, params.max_block_level));
        let pruning_manager = Arc::new(PruningManager::new(genesis_hash, params.pruning_depth()));
        let coinbase_manager = Arc::new(CoinbaseManager::new(
            genesis_hash,
            params.base_subsidy,
            params.genesis_subsidy,
            params.halving_interval_daa_score,
            params.max_coinbase_payload_len,
        ));
        let transaction_validator = Arc::new(TransactionValidator::new(params.coinbase_maturity));
        let header_validator = Arc::new(HeaderValidator::new(
            params.max_block_parents as usize,
            params.max_future_block_time_offset(),
            params.skip_proof_of_work,
            ghostdag_manager.clone(),
            difficulty_manager.clone(),
            past_median_time_manager.clone(),
            parents_manager.clone(),
            pruning_manager.clone(),
        ));
        let block_validator = BlockValidator::new(
            params.max_block_mass,
            params.max_coinbase_payload_len,
            MassCalculator::new_with_consensus_params(params),
            header_validator.clone(),
            transaction_validator.clone(),
        );
        let virtual_processor = Arc::new(VirtualProcessor::new(
            params.max_block_parents as usize,
            ghostdag_manager,
            difficulty_manager,
            past_median_time_manager,
            pruning_manager.clone(),
            transaction_validator,
        ));
        let block_processor = BlockProcessor::new(header_validator.clone(), coinbase_manager.clone(), virtual_processor.clone());
        let template_builder = BlockTemplateBuilder::new(header_validator, coinbase_manager.clone(), virtual_processor.clone());
        let pruning_proof_manager = PruningProofManager::new(
            genesis_hash,
            params.pruning_proof_m,
            params.max_block_level,
            params.skip_proof_of_work,
            parents_manager,
        );

        let storage = Arc::new(ConsensusStorage::new(db));
        let (state, chain_index) = match storage.metadata.get::<VirtualState>(KEY_VIRTUAL_STATE)? {
            Some(state) => Self::load_virtual(&storage, &virtual_processor, state)?,
            None => Self::init_genesis(&config, &storage, &virtual_processor)?,
        };
        info!(
            "consensus ready on {}: sink {}, virtual daa score {}, {} blocks",
            config.network,
            state.sink(),
            state.daa_score,
            state.block_count
        );

        let (notifier, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            storage,
            block_validator,
            block_processor,
            template_builder,
            coinbase_manager,
            pruning_manager,
            pruning_proof_manager,
            processing: Mutex::new(chain_index),
            virtual_state: RwLock::new(Arc::new(state)),
            pruning_cursor: Mutex::new(None),
            notifier,
        })
    }

    fn init_genesis(
        config: &Config,
        storage: &ConsensusStorage,
        virtual_processor: &VirtualProcessor,
    ) -> ConsensusResult<(VirtualState, SelectedChainIndex)> {
        let genesis = config.genesis.build_block();
        let hash = genesis.hash();
        let ghostdag_data = GhostdagData::genesis(calc_work(config.genesis.bits));
        let acceptance_data = vec![MergesetBlockAcceptanceData {
            block_hash: hash,
            accepted_transactions: genesis.transactions.iter().map(|tx| tx.id()).collect(),
        }];

        let mut staging = StagingArea::new(storage);
        staging.stage_header(Arc::new(genesis.header.clone()))?;
        staging.stage_body(hash, Arc::new(BlockBody { transactions: genesis.transactions }))?;
        staging.stage_ghostdag_data(hash, Arc::new(ghostdag_data))?;
        staging.stage_height(hash, 0)?;
        staging.stage_status(hash, BlockStatus::Active)?;
        staging.stage_utxo_diff(hash, Arc::new(UtxoDiff::default()))?;
        staging.stage_acceptance_data(hash, Arc::new(acceptance_data))?;

        let chain_index = SelectedChainIndex::from_sink(&staging, hash)?;
        let bootstrap = VirtualState {
            parents: vec![hash],
            ghostdag_data: GhostdagData::new_with_selected_parent(hash, config.ghostdag_k),
            daa_score: 0,
            bits: config.genesis.bits,
            past_median_time: config.genesis.timestamp,
            multiset: EMPTY_MUHASH,
            tips: vec![hash],
            pruning_point: PruningPointInfo::genesis(hash),
            header_count: 1,
            block_count: 1,
        };
        let (state, _) = virtual_processor.build_virtual_state(&staging, &chain_index, &bootstrap, hash, EMPTY_MUHASH)?;
        staging.stage_metadata(KEY_VIRTUAL_STATE, &state)?;
        staging.commit()?;
        info!("initialized an empty store with genesis {}", hash);
        Ok((state, chain_index))
    }

    fn load_virtual(
        storage: &ConsensusStorage,
        virtual_processor: &VirtualProcessor,
        state: VirtualState,
    ) -> ConsensusResult<(VirtualState, SelectedChainIndex)> {
        let mut chain_index = SelectedChainIndex::from_sink(storage, state.sink())?;
        let mut staging = StagingArea::new(storage);
        let update = virtual_processor.resolve_virtual(&mut staging, &chain_index, &state)?;
        if update.state != state {
            info!("virtual state changed on reload, new sink {}", update.state.sink());
            staging.stage_metadata(KEY_VIRTUAL_STATE, &update.state)?;
        }
        if !staging.is_empty() {
            staging.commit()?;
        }
        chain_index.apply_reorg(update.fork_blue_score, update.added_chain_blocks);
        debug!("loaded virtual state with {} tips and {} chain blocks", update.state.tips.len(), chain_index.len());
        Ok((update.state, chain_index))
    }

    /// Flushes and closes the store. The instance must not be used afterwards.
    pub fn teardown(&self) -> ConsensusResult<()> {
        let _guard = self.processing.lock();
        self.storage.db().flush()?;
        self.storage.db().close();
        info!("consensus store closed");
        Ok(())
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn storage(&self) -> &Arc<ConsensusStorage> {
        &self.storage
    }

    pub fn max_future_block_time_offset(&self) -> u64 {
        self.config.max_future_block_time_offset()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// The current virtual state snapshot
    pub fn virtual_state(&self) -> Arc<VirtualState> {
        self.virtual_state.read().clone()
    }

    /// `Some` with the status of a block already known, `Err` for a block known to be invalid
    pub fn known_block_status(&self, block: &Block) -> ConsensusResult<Option<BlockStatus>> {
        match self.storage.get_status(&block.hash())? {
            BlockStatus::Unknown => Ok(None),
            BlockStatus::Invalid => Err(RuleError::KnownInvalid.into()),
            status => Ok(Some(status)),
        }
    }

    pub fn validate_block_in_isolation(&self, block: &Block) -> BlockProcessResult<()> {
        self.block_validator.validate_block_in_isolation(block, unix_now())
    }

    /// Records an isolation failure. The hash is marked invalid unless the error says otherwise.
    pub fn reject_in_isolation(&self, hash: Hash, err: RuleError) -> ConsensusError {
        debug!("block {} failed isolation checks: {}", hash, err);
        if err.caches_invalid_status() {
            if let Err(store_err) = self.store_invalid_status(hash) {
                warn!("failed to record invalid block {}: {}", hash, store_err);
            }
        }
        err.into()
    }

    fn store_invalid_status(&self, hash: Hash) -> ConsensusResult<()> {
        let _guard = self.processing.lock();
        let mut staging = StagingArea::new(&self.storage);
        staging.stage_status(hash, BlockStatus::Invalid)?;
        staging.commit()
    }

    /// Contextual processing of a block that passed the isolation checks
    pub fn process_validated_block(&self, block: Block) -> ConsensusResult<BlockStatus> {
        let hash = block.hash();
        let mut chain_index = self.processing.lock();
        if let Some(status) = self.known_block_status(&block)? {
            return Ok(status);
        }

        let prev = self.virtual_state();
        let StagedBlock { staging, status, update } =
            self.block_processor.process_block(&self.storage, &chain_index, &prev, &block)?;
        self.commit_virtual(staging, update.state.clone())?;
        chain_index.apply_reorg(update.fork_blue_score, update.added_chain_blocks.iter().copied());

        info!(
            "block {} added: blue score {}, daa score {}, status {:?}",
            hash, block.header.blue_score, block.header.daa_score, status
        );
        self.notify(&block, &prev, &update);
        Ok(status)
    }

    /// Commits `staging` and publishes `state` as one step for readers of the snapshot
    fn commit_virtual(&self, staging: StagingArea, state: VirtualState) -> ConsensusResult<()> {
        let mut snapshot = self.virtual_state.write();
        staging.commit()?;
        *snapshot = Arc::new(state);
        Ok(())
    }

    fn notify(&self, block: &Block, prev: &VirtualState, update: &VirtualUpdate) {
        let mut events = vec![Notification::BlockAdded {
            hash: block.hash(),
            blue_score: block.header.blue_score,
            daa_score: block.header.daa_score,
        }];
        if update.chain_changed() {
            events.push(Notification::VirtualChainChanged {
                removed_chain_block_hashes: update.removed_chain_blocks.clone(),
                added_chain_block_hashes: update.added_hashes(),
                accepted_transaction_ids: update.accepted_transaction_ids.clone(),
            });
        }
        if update.state.daa_score != prev.daa_score {
            events.push(Notification::VirtualDaaScoreChanged(update.state.daa_score));
        }
        if update.pruning_point_advanced {
            events.push(Notification::PruningPointAdvanced(update.state.pruning_point.pruning_point));
        }
        for event in events {
            trace!("publishing {}", event.event_name());
            // No subscribers is not an error
            let _ = self.notifier.send(event);
        }
    }

    /// Whether history below the pruning point is still waiting to be pruned
    pub fn pruning_pending(&self) -> bool {
        let pruning_point = self.virtual_state.read().pruning_point;
        pruning_point.history_pruned_up_to != pruning_point.pruning_point
    }

    /// Prunes one batch when pruning is enabled and pending. Returns the number of pruned blocks.
    pub fn prune_if_needed(&self, cancel: &AtomicBool) -> ConsensusResult<usize> {
        if !self.config.enable_pruning || !self.pruning_pending() {
            return Ok(0);
        }
        self.prune_step(cancel)
    }

    /// Prunes at most `pruning_batch_size` blocks under the processing lock. The last batch below
    /// a pruning point also records it as `history_pruned_up_to`. A pruning point that moved since
    /// the previous step restarts the collection from the new one.
    pub fn prune_step(&self, cancel: &AtomicBool) -> ConsensusResult<usize> {
        if cancel.load(Ordering::Relaxed) {
            return Err(ConsensusError::cancelled());
        }
        let _guard = self.processing.lock();
        let info = self.virtual_state().pruning_point;
        if info.history_pruned_up_to == info.pruning_point {
            return Ok(0);
        }

        let mut cursor = self.pruning_cursor.lock();
        if cursor.as_ref().map_or(true, |cursor| cursor.pruning_point != info.pruning_point) {
            let prunable = self.pruning_manager.collect_prunable(self.storage.as_ref(), info.pruning_point)?;
            info!("pruning {} blocks below pruning point {}", prunable.len(), info.pruning_point);
            *cursor = Some(PruningCursor { pruning_point: info.pruning_point, prunable, next: 0 });
        }
        let Some(current) = cursor.as_mut() else {
            return Ok(0);
        };

        let end = (current.next + self.config.pruning_batch_size.max(1)).min(current.prunable.len());
        let batch = &current.prunable[current.next..end];
        let mut state = (*self.virtual_state()).clone();
        let mut staging = StagingArea::new(&self.storage);
        self.pruning_manager.stage_prune(&mut staging, batch)?;
        state.block_count = state.block_count.saturating_sub(batch.len() as u64);
        let finished = end == current.prunable.len();
        if finished {
            state.pruning_point.history_pruned_up_to = info.pruning_point;
        }
        staging.stage_metadata(KEY_VIRTUAL_STATE, &state)?;
        self.commit_virtual(staging, state)?;

        let pruned = batch.len();
        current.next = end;
        if finished {
            info!("pruned history below {}", info.pruning_point);
            *cursor = None;
        } else {
            trace!("pruned {} blocks, {} left below {}", pruned, current.prunable.len() - end, info.pruning_point);
        }
        Ok(pruned)
    }

    fn nearly_synced_at(&self, sink_timestamp: u64) -> bool {
        unix_now().saturating_sub(sink_timestamp) <= self.config.expected_daa_window_duration_ms()
    }
}

impl ConsensusApi for Consensus {
    fn add_block(&self, mut block: Block) -> ConsensusResult<BlockStatus> {
        block.finalize();
        if let Some(status) = self.known_block_status(&block)? {
            return Ok(status);
        }
        if let Err(err) = self.validate_block_in_isolation(&block) {
            return Err(self.reject_in_isolation(block.hash(), err));
        }
        self.process_validated_block(block)
    }

    fn get_sync_info(&self) -> ConsensusResult<SyncInfo> {
        let state = self.virtual_state();
        let sink = state.sink();
        let sink_timestamp = self.storage.header(&sink)?.timestamp;
        let nearly_synced = self.nearly_synced_at(sink_timestamp);
        Ok(SyncInfo {
            is_synced: nearly_synced,
            is_nearly_synced: nearly_synced,
            virtual_blue_score: state.ghostdag_data.blue_score,
            virtual_daa_score: state.daa_score,
            sink,
            sink_timestamp,
            pruning_point: state.pruning_point.pruning_point,
            tip_hashes: state.tips.clone(),
            header_count: state.header_count,
            block_count: state.block_count,
        })
    }

    fn get_virtual_daa_score(&self) -> u64 {
        self.virtual_state.read().daa_score
    }

    fn is_nearly_synced(&self) -> bool {
        let sink = self.virtual_state.read().sink();
        match self.storage.get_header(&sink) {
            Ok(Some(header)) => self.nearly_synced_at(header.timestamp),
            _ => false,
        }
    }

    fn get_block_status(&self, hash: Hash) -> ConsensusResult<BlockStatus> {
        self.storage.get_status(&hash)
    }

    fn get_ghostdag_data(&self, hash: Hash) -> ConsensusResult<Arc<GhostdagData>> {
        self.storage.ghostdag_data(&hash)
    }

    fn get_sink(&self) -> Hash {
        self.virtual_state.read().sink()
    }

    fn get_tips(&self) -> Vec<Hash> {
        self.virtual_state.read().tips.clone()
    }

    fn get_pruning_point(&self) -> Hash {
        self.virtual_state.read().pruning_point.pruning_point
    }

    fn get_virtual_utxo(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        // The set matches the snapshot while its read guard is held
        let _snapshot = self.virtual_state.read();
        Ok(self.storage.utxo_set.get(outpoint)?)
    }

    fn calc_block_subsidy(&self, daa_score: u64) -> u64 {
        self.coinbase_manager.calc_subsidy_at(daa_score)
    }

    fn build_block_template(&self, miner_data: MinerData, txs: Vec<Transaction>) -> ConsensusResult<BlockTemplate> {
        let chain_index = self.processing.lock();
        let state = self.virtual_state();
        self.template_builder.build_template(&self.storage, &chain_index, &state, miner_data, txs)
    }

    fn build_block_with_parents(
        &self,
        parents: Vec<Hash>,
        miner_data: MinerData,
        txs: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block> {
        let chain_index = self.processing.lock();
        let state = self.virtual_state();
        self.template_builder.build_block(&self.storage, &chain_index, &state, parents, miner_data, txs, timestamp)
    }

    fn generate_pruning_point_proof(&self, cancel: &AtomicBool) -> ConsensusResult<PruningPointProof> {
        let pruning_point = self.virtual_state().pruning_point.pruning_point;
        self.pruning_proof_manager.generate(self.storage.as_ref(), pruning_point, cancel, || self.processing.lock())
    }

    fn verify_pruning_point_proof(&self, proof: &PruningPointProof, cancel: &AtomicBool) -> ConsensusResult<()> {
        let claimed = proof
            .first()
            .and_then(|level| level.last())
            .map(|header| header.hash)
            .ok_or_else(|| ConsensusError::from(RuleError::BadPruningProof("proof has no level-0 headers".to_string())))?;
        self.pruning_proof_manager.verify(proof, claimed, cancel)
    }

    fn prune(&self, cancel: &AtomicBool) -> ConsensusResult<usize> {
        let mut pruned = 0;
        while self.pruning_pending() {
            match self.prune_step(cancel) {
                Ok(count) => pruned += count,
                Err(err) => {
                    debug!("pruning stopped after {} blocks: {}", pruned, err);
                    return Err(err);
                }
            }
        }
        Ok(pruned)
    }
}
