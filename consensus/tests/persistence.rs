mod common;

use common::*;
use consensus::Consensus;
use consensus_core::api::ConsensusApi;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::config::Config;
use database::Database;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Consensus {
    let db = Database::open(dir.path()).unwrap();
    Consensus::init(Config::new(test_params()), db).unwrap()
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (state, outpoint) = {
        let consensus = open(&dir);
        let genesis = consensus.config().genesis.hash();
        let chain = add_chain(&consensus, genesis, 5);
        let side = add(&consensus, &[chain[2]]);
        assert_eq!(consensus.get_block_status(side).unwrap(), BlockStatus::Pending);

        let block = build(&consensus, &[chain[4]]);
        let outpoint = coinbase_outpoint(&block);
        consensus.add_block(block).unwrap();
        let state = consensus.virtual_state();
        consensus.teardown().unwrap();
        (state, outpoint)
    };

    let consensus = open(&dir);
    assert_eq!(*consensus.virtual_state(), *state);
    assert_eq!(consensus.get_tips().len(), 2);
    assert!(consensus.get_virtual_utxo(&outpoint).unwrap().is_some());

    // Processing continues where it stopped
    let tip = add(&consensus, &[consensus.get_sink()]);
    assert_eq!(consensus.get_sink(), tip);
    assert_eq!(consensus.virtual_state().block_count, state.block_count + 1);
}

#[test]
fn test_pruned_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let pruning_point = {
        let consensus = open(&dir);
        let genesis = consensus.config().genesis.hash();
        add_chain(&consensus, genesis, 80);
        consensus.prune(&AtomicBool::new(false)).unwrap();
        let pruning_point = consensus.get_pruning_point();
        consensus.teardown().unwrap();
        pruning_point
    };

    let consensus = open(&dir);
    let genesis = consensus.config().genesis.hash();
    assert_eq!(consensus.get_pruning_point(), pruning_point);
    assert_eq!(consensus.virtual_state().pruning_point.history_pruned_up_to, pruning_point);
    assert_eq!(consensus.get_block_status(genesis).unwrap(), BlockStatus::Pruned);
    assert_eq!(consensus.prune(&AtomicBool::new(false)).unwrap(), 0);
}

#[test]
fn test_closed_store_reports_errors() {
    let dir = TempDir::new().unwrap();
    let consensus = open(&dir);
    let genesis = consensus.config().genesis.hash();
    let block = build(&consensus, &[genesis]);
    consensus.teardown().unwrap();
    assert!(consensus.add_block(block).is_err());
}
