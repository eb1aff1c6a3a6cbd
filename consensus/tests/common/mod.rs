#![allow(dead_code)]

use consensus::{Consensus, ConsensusReader};
use consensus_core::api::ConsensusApi;
use consensus_core::block::Block;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::coinbase::MinerData;
use consensus_core::config::constants::TX_VERSION;
use consensus_core::config::params::Params;
use consensus_core::config::Config;
use consensus_core::subnets::SUBNETWORK_ID_NATIVE;
use consensus_core::tx::{ScriptPublicKey, Transaction, TransactionInput, TransactionOutpoint, TransactionOutput};
use consensus_core::utxo::UtxoCollection;
use consensus_core::Hash;
use database::Database;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

/// Small simnet parameters: K = 3, mergeset limit 4, pruning depth 66, coinbase maturity 2
pub fn test_params() -> Params {
    let mut params = Params::simnet();
    params.ghostdag_k = 3;
    params.mergeset_size_limit = 4;
    params.max_block_parents = 5;
    params.difficulty_adjustment_window_size = 10;
    params.timestamp_deviation_tolerance = 6;
    params.target_time_per_block = 1_000;
    params.finality_duration = 5_000;
    params.pruning_proof_m = 5;
    params.merge_depth = 100;
    params.coinbase_maturity = 2;
    params
}

pub fn consensus_with(params: Params) -> Arc<Consensus> {
    Arc::new(Consensus::init(Config::new(params), Database::in_memory()).unwrap())
}

pub fn test_consensus() -> Arc<Consensus> {
    consensus_with(test_params())
}

pub fn miner_spk() -> ScriptPublicKey {
    ScriptPublicKey::from_vec(0, vec![0x51])
}

/// Miner data with unique extra data, so that no two coinbases share an id
pub fn miner_data() -> MinerData {
    let tag = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
    MinerData::new(miner_spk(), tag.to_le_bytes().to_vec())
}

pub fn build(consensus: &Consensus, parents: &[Hash]) -> Block {
    consensus.build_block_with_parents(parents.to_vec(), miner_data(), vec![], None).unwrap()
}

pub fn build_with_txs(consensus: &Consensus, parents: &[Hash], txs: Vec<Transaction>) -> Block {
    consensus.build_block_with_parents(parents.to_vec(), miner_data(), txs, None).unwrap()
}

/// Builds and adds a block, returning its hash
pub fn add(consensus: &Consensus, parents: &[Hash]) -> Hash {
    let block = build(consensus, parents);
    let hash = block.hash();
    let status = consensus.add_block(block).unwrap();
    assert_ne!(status, BlockStatus::Invalid);
    hash
}

/// Adds a selected chain of `len` blocks on top of `from`, returning the blocks in order
pub fn add_chain(consensus: &Consensus, from: Hash, len: usize) -> Vec<Hash> {
    let mut chain = Vec::with_capacity(len);
    let mut tip = from;
    for _ in 0..len {
        tip = add(consensus, &[tip]);
        chain.push(tip);
    }
    chain
}

pub fn coinbase_outpoint(block: &Block) -> TransactionOutpoint {
    TransactionOutpoint::new(block.transactions[0].id(), 0)
}

pub fn spend(outpoint: TransactionOutpoint, value: u64) -> Transaction {
    Transaction::new(
        TX_VERSION,
        vec![TransactionInput::new(outpoint, vec![], 0, 1)],
        vec![TransactionOutput::new(value, miner_spk())],
        0,
        SUBNETWORK_ID_NATIVE,
        0,
        vec![],
    )
}

/// A block as stored by `consensus`, ready to be fed to another instance
pub fn stored_block(consensus: &Consensus, hash: Hash) -> Block {
    let storage = consensus.storage();
    Block::new((*storage.header(&hash).unwrap()).clone(), storage.body(&hash).unwrap().transactions.clone())
}

/// The virtual UTXO commitment together with the full virtual UTXO set
pub fn utxo_snapshot(consensus: &Consensus) -> (Hash, UtxoCollection) {
    (consensus.virtual_state().multiset.finalize(), consensus.storage().utxo_set.collect_all().unwrap())
}
