use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::block::{Block, BlockTemplate};
use crate::blockstatus::BlockStatus;
use crate::coinbase::MinerData;
use crate::errors::ConsensusResult;
use crate::ghostdag::GhostdagData;
use crate::pruning::PruningPointProof;
use crate::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use crate::Hash;

pub mod notifications;

/// Sync status reported to the RPC layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    pub is_synced: bool,
    pub is_nearly_synced: bool,
    pub virtual_blue_score: u64,
    pub virtual_daa_score: u64,
    pub sink: Hash,
    pub sink_timestamp: u64,
    pub pruning_point: Hash,
    pub tip_hashes: Vec<Hash>,
    pub header_count: u64,
    pub block_count: u64,
}

/// The consensus engine as seen by its collaborators (RPC, mempool, mining, P2P)
pub trait ConsensusApi: Send + Sync {
    /// Validates, orders and connects a block. Idempotent: a known block returns its current status.
    fn add_block(&self, block: Block) -> ConsensusResult<BlockStatus>;

    fn get_sync_info(&self) -> ConsensusResult<SyncInfo>;

    fn get_virtual_daa_score(&self) -> u64;

    fn is_nearly_synced(&self) -> bool;

    fn get_block_status(&self, hash: Hash) -> ConsensusResult<BlockStatus>;

    fn get_ghostdag_data(&self, hash: Hash) -> ConsensusResult<Arc<GhostdagData>>;

    fn get_sink(&self) -> Hash;

    fn get_tips(&self) -> Vec<Hash>;

    fn get_pruning_point(&self) -> Hash;

    fn get_virtual_utxo(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>>;

    /// Subsidy of a block at `daa_score`. The subsidy-eligible DAA score of the next block is the virtual DAA score.
    fn calc_block_subsidy(&self, daa_score: u64) -> u64;

    /// Builds a block on top of the current virtual parents
    fn build_block_template(&self, miner_data: MinerData, txs: Vec<Transaction>) -> ConsensusResult<BlockTemplate>;

    /// Builds a fully consistent block over arbitrary known parents without committing anything
    fn build_block_with_parents(
        &self,
        parents: Vec<Hash>,
        miner_data: MinerData,
        txs: Vec<Transaction>,
        timestamp: Option<u64>,
    ) -> ConsensusResult<Block>;

    fn generate_pruning_point_proof(&self, cancel: &AtomicBool) -> ConsensusResult<PruningPointProof>;

    fn verify_pruning_point_proof(&self, proof: &PruningPointProof, cancel: &AtomicBool) -> ConsensusResult<()>;

    /// Deletes data below the pruning point. Returns the number of blocks pruned.
    fn prune(&self, cancel: &AtomicBool) -> ConsensusResult<usize>;
}
