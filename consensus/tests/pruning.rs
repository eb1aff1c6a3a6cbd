mod common;

use common::*;
use consensus::ConsensusReader;
use consensus_core::api::notifications::Notification;
use consensus_core::api::ConsensusApi;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, RuleError};
use std::sync::atomic::AtomicBool;

const CHAIN_LEN: usize = 80;

#[test]
fn test_pruning_point_advances_and_prunes_history() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    assert_eq!(consensus.config().pruning_depth(), 66);

    let orphaned = build(&consensus, &[genesis]);
    let mut receiver = consensus.subscribe();
    let chain = add_chain(&consensus, genesis, CHAIN_LEN);

    let pruning_point = consensus.get_pruning_point();
    assert_ne!(pruning_point, genesis);
    let pruning_point_blue_score = consensus.get_ghostdag_data(pruning_point).unwrap().blue_score;
    let virtual_blue_score = consensus.virtual_state().ghostdag_data.blue_score;
    assert!(virtual_blue_score - pruning_point_blue_score >= 66);
    assert!(chain.contains(&pruning_point));

    let mut advanced = 0;
    while let Ok(notification) = receiver.try_recv() {
        if let Notification::PruningPointAdvanced(_) = notification {
            advanced += 1;
        }
    }
    assert!(advanced > 0);

    let cancel = AtomicBool::new(false);
    let pruned = consensus.prune(&cancel).unwrap();
    let position = chain.iter().position(|hash| *hash == pruning_point).unwrap();
    assert_eq!(pruned, position + 1);
    assert_eq!(consensus.prune(&cancel).unwrap(), 0);

    assert_eq!(consensus.get_block_status(genesis).unwrap(), BlockStatus::Pruned);
    assert_eq!(consensus.get_block_status(chain[0]).unwrap(), BlockStatus::Pruned);
    assert_eq!(consensus.get_block_status(pruning_point).unwrap(), BlockStatus::Active);
    assert!(consensus.storage().get_body(&chain[0]).unwrap().is_none());
    assert!(consensus.storage().get_header(&chain[0]).unwrap().is_some());

    let state = consensus.virtual_state();
    assert_eq!(state.pruning_point.history_pruned_up_to, pruning_point);
    assert_eq!(state.block_count, (CHAIN_LEN + 1 - pruned) as u64);

    let err = consensus.add_block(orphaned).unwrap_err();
    assert_eq!(err, ConsensusError::Rule(RuleError::PrunedParent(genesis)));
    let err = consensus.build_block_with_parents(vec![genesis], miner_data(), vec![], None).unwrap_err();
    assert_eq!(err, ConsensusError::Rule(RuleError::PrunedParent(genesis)));

    // The pruned DAG keeps growing
    let tip = add(&consensus, &[*chain.last().unwrap()]);
    assert_eq!(consensus.get_sink(), tip);
}

#[test]
fn test_archive_config_disables_pruning() {
    let mut config = consensus_core::config::Config::new(test_params());
    config.enable_pruning = false;
    let consensus = consensus::Consensus::init(config, database::Database::in_memory()).unwrap();
    let genesis = consensus.config().genesis.hash();
    add_chain(&consensus, genesis, CHAIN_LEN);

    assert_ne!(consensus.get_pruning_point(), genesis);
    assert_eq!(consensus.prune_if_needed(&AtomicBool::new(false)).unwrap(), 0);
    assert_eq!(consensus.get_block_status(genesis).unwrap(), BlockStatus::Active);
}

#[test]
fn test_cancelled_pruning_keeps_history() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    add_chain(&consensus, genesis, CHAIN_LEN);

    let err = consensus.prune(&AtomicBool::new(true)).unwrap_err();
    assert_eq!(err, ConsensusError::cancelled());
    assert_eq!(consensus.get_block_status(genesis).unwrap(), BlockStatus::Active);
    assert!(consensus.prune(&AtomicBool::new(false)).unwrap() > 0);
}

#[test]
fn test_pruning_point_proof() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    add_chain(&consensus, genesis, CHAIN_LEN);
    let cancel = AtomicBool::new(false);

    let proof = consensus.generate_pruning_point_proof(&cancel).unwrap();
    assert!(!proof.is_empty());
    assert_eq!(proof[0].last().unwrap().hash, consensus.get_pruning_point());
    consensus.verify_pruning_point_proof(&proof, &cancel).unwrap();

    let mut tampered = proof.clone();
    tampered[0][0].timestamp += 1;
    let err = consensus.verify_pruning_point_proof(&tampered, &cancel).unwrap_err();
    assert!(matches!(err, ConsensusError::Rule(RuleError::BadPruningProof(_))), "{err}");

    let err = consensus.verify_pruning_point_proof(&vec![], &cancel).unwrap_err();
    assert!(matches!(err, ConsensusError::Rule(RuleError::BadPruningProof(_))));

    // Proofs are still served once the history below the pruning point is gone
    consensus.prune(&cancel).unwrap();
    let after_pruning = consensus.generate_pruning_point_proof(&cancel).unwrap();
    assert_eq!(after_pruning, proof);
}

#[test]
fn test_pruning_runs_in_batches_between_blocks() {
    let mut config = consensus_core::config::Config::new(test_params());
    config.pruning_batch_size = 4;
    let consensus = consensus::Consensus::init(config, database::Database::in_memory()).unwrap();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, CHAIN_LEN);
    let cancel = AtomicBool::new(false);

    assert_eq!(consensus.prune_step(&cancel).unwrap(), 4);
    assert!(consensus.pruning_pending());
    assert_eq!(consensus.get_block_status(genesis).unwrap(), BlockStatus::Pruned);
    assert_eq!(consensus.virtual_state().pruning_point.history_pruned_up_to, genesis);

    // Blocks keep flowing in the middle of a pruning run, moving the pruning point along
    let tip = add(&consensus, &[*chain.last().unwrap()]);
    assert_eq!(consensus.get_sink(), tip);

    let mut pruned = 4;
    while consensus.pruning_pending() {
        let step = consensus.prune_step(&cancel).unwrap();
        assert!(step <= 4);
        pruned += step;
    }
    assert_eq!(consensus.prune_step(&cancel).unwrap(), 0);

    let pruning_point = consensus.get_pruning_point();
    let position = chain.iter().position(|hash| *hash == pruning_point).unwrap();
    assert_eq!(pruned, position + 1);
    let state = consensus.virtual_state();
    assert_eq!(state.pruning_point.history_pruned_up_to, pruning_point);
    assert_eq!(state.block_count, (CHAIN_LEN + 2 - pruned) as u64);
    assert_eq!(consensus.get_block_status(chain[position - 1]).unwrap(), BlockStatus::Pruned);
    assert_eq!(consensus.get_block_status(pruning_point).unwrap(), BlockStatus::Active);
}

#[test]
fn test_pruning_point_never_moves_back_across_a_reorg() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, CHAIN_LEN);
    let pruning_point_blue_score = |consensus: &consensus::Consensus| {
        consensus.get_ghostdag_data(consensus.get_pruning_point()).unwrap().blue_score
    };

    // A branch from ten blocks below the tip overtakes the chain after eleven blocks
    let fork = chain[CHAIN_LEN - 11];
    let mut last = pruning_point_blue_score(&consensus);
    let mut tip = fork;
    for _ in 0..12 {
        tip = add(&consensus, &[tip]);
        let current = pruning_point_blue_score(&consensus);
        assert!(current >= last, "pruning point moved back from blue score {last} to {current}");
        last = current;
    }

    assert_eq!(consensus.get_sink(), tip);
    assert_eq!(consensus.get_block_status(chain[CHAIN_LEN - 1]).unwrap(), BlockStatus::Superseded);
    let pruning_point = consensus.get_pruning_point();
    assert!(chain[..CHAIN_LEN - 10].contains(&pruning_point));
    assert_eq!(consensus.get_block_status(pruning_point).unwrap(), BlockStatus::Active);
}
