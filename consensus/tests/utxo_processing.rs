mod common;

use common::*;
use consensus::ConsensusReader;
use consensus_core::api::ConsensusApi;
use consensus_core::block::Block;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, RuleError, TxRuleError};
use consensus_core::tx::TransactionOutpoint;
use consensus_core::Hash;

fn coinbase_value(block: &Block) -> u64 {
    block.transactions[0].outputs[0].value
}

#[test]
fn test_spend_mature_coinbase() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, 3);
    let funding = stored_block(&consensus, chain[0]);
    let outpoint = coinbase_outpoint(&funding);
    let entry = consensus.get_virtual_utxo(&outpoint).unwrap().unwrap();
    assert!(entry.is_coinbase);
    assert_eq!(entry.amount, coinbase_value(&funding));
    assert_eq!(entry.block_daa_score, funding.header.daa_score);

    let tx = spend(outpoint, entry.amount - 100);
    let block = build_with_txs(&consensus, &[chain[2]], vec![tx.clone()]);
    assert!(block.header.daa_score >= entry.block_daa_score + consensus.config().coinbase_maturity);
    assert_eq!(consensus.add_block(block).unwrap(), BlockStatus::Active);

    assert!(consensus.get_virtual_utxo(&outpoint).unwrap().is_none());
    let created = consensus.get_virtual_utxo(&TransactionOutpoint::new(tx.id(), 0)).unwrap().unwrap();
    assert_eq!(created.amount, entry.amount - 100);
    assert!(!created.is_coinbase);
}

#[test]
fn test_immature_coinbase_spend_is_rejected() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, 3);
    let outpoint = coinbase_outpoint(&stored_block(&consensus, chain[2]));

    let tx = spend(outpoint, 1);
    let err = consensus.build_block_with_parents(vec![chain[2]], miner_data(), vec![tx.clone()], None).unwrap_err();
    match err {
        ConsensusError::Rule(RuleError::InvalidTransactionsInUtxoContext(id, TxRuleError::ImmatureCoinbaseSpend(..))) => {
            assert_eq!(id, tx.id())
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_spend_of_missing_outpoint_is_rejected() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let tip = add(&consensus, &[genesis]);
    let tx = spend(TransactionOutpoint::new(Hash::from_u64_word(99), 0), 1);
    let err = consensus.build_block_with_parents(vec![tip], miner_data(), vec![tx], None).unwrap_err();
    assert!(
        matches!(err, ConsensusError::Rule(RuleError::InvalidTransactionsInUtxoContext(_, TxRuleError::MissingTxOutpoints(_)))),
        "{err}"
    );
}

#[test]
fn test_merged_double_spend_accepts_one() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, 3);
    let outpoint = coinbase_outpoint(&stored_block(&consensus, chain[0]));
    let amount = consensus.get_virtual_utxo(&outpoint).unwrap().unwrap().amount;

    let first_tx = spend(outpoint, amount - 1);
    let second_tx = spend(outpoint, amount - 2);
    let first = build_with_txs(&consensus, &[chain[2]], vec![first_tx.clone()]);
    let second = build_with_txs(&consensus, &[chain[2]], vec![second_tx.clone()]);
    consensus.add_block(first.clone()).unwrap();
    consensus.add_block(second.clone()).unwrap();

    let merging = add(&consensus, &[first.hash(), second.hash()]);
    assert_eq!(consensus.get_sink(), merging);

    let first_created = consensus.get_virtual_utxo(&TransactionOutpoint::new(first_tx.id(), 0)).unwrap().is_some();
    let second_created = consensus.get_virtual_utxo(&TransactionOutpoint::new(second_tx.id(), 0)).unwrap().is_some();
    assert!(first_created ^ second_created);
    assert!(consensus.get_virtual_utxo(&outpoint).unwrap().is_none());

    let accepted = consensus.storage().get_acceptance_data(&merging).unwrap().unwrap();
    let accepted_ids: Vec<_> = accepted.iter().flat_map(|entry| entry.accepted_transactions.iter().copied()).collect();
    assert!(!(accepted_ids.contains(&first_tx.id()) && accepted_ids.contains(&second_tx.id())));
}

#[test]
fn test_reorg_restores_spent_output() {
    let consensus = test_consensus();
    let genesis = consensus.config().genesis.hash();
    let chain = add_chain(&consensus, genesis, 3);
    let outpoint = coinbase_outpoint(&stored_block(&consensus, chain[0]));
    let amount = consensus.get_virtual_utxo(&outpoint).unwrap().unwrap().amount;

    let spending = build_with_txs(&consensus, &[chain[2]], vec![spend(outpoint, amount - 1)]);
    consensus.add_block(spending.clone()).unwrap();
    assert!(consensus.get_virtual_utxo(&outpoint).unwrap().is_none());

    // A longer branch that does not contain the spend
    let branch = add_chain(&consensus, chain[2], 2);
    assert_eq!(consensus.get_sink(), branch[1]);
    assert_eq!(consensus.get_block_status(spending.hash()).unwrap(), BlockStatus::Superseded);
    assert!(consensus.get_virtual_utxo(&outpoint).unwrap().is_some());
}

#[test]
fn test_halving_schedule() {
    let mut params = test_params();
    params.base_subsidy = 1_000;
    params.halving_interval_daa_score = 2;
    let consensus = consensus_with(params);

    assert_eq!(consensus.calc_block_subsidy(0), 1_000);
    assert_eq!(consensus.calc_block_subsidy(1), 1_000);
    assert_eq!(consensus.calc_block_subsidy(2), 500);
    assert_eq!(consensus.calc_block_subsidy(5), 250);
    assert_eq!(consensus.calc_block_subsidy(2 * 10), 0);
    assert_eq!(consensus.calc_block_subsidy(2 * 64), 0);

    let genesis = consensus.config().genesis.hash();
    for hash in add_chain(&consensus, genesis, 4) {
        let block = stored_block(&consensus, hash);
        let expected = consensus.calc_block_subsidy(block.header.daa_score);
        let paid: u64 = block.transactions[0].outputs.iter().map(|output| output.value).sum();
        assert_eq!(paid, expected);
    }
}

#[test]
fn test_zero_subsidy_coinbase_has_no_outputs() {
    let mut params = test_params();
    params.base_subsidy = 1;
    params.halving_interval_daa_score = 1;
    let consensus = consensus_with(params);
    let genesis = consensus.config().genesis.hash();

    let chain = add_chain(&consensus, genesis, 2);
    let block = stored_block(&consensus, chain[1]);
    assert!(block.transactions[0].outputs.is_empty());
    assert_eq!(consensus.get_block_status(chain[1]).unwrap(), BlockStatus::Active);
}

#[test]
fn test_virtual_utxo_is_never_ahead_of_the_virtual_state() {
    let source = test_consensus();
    let genesis = source.config().genesis.hash();
    let blocks: Vec<Block> = add_chain(&source, genesis, 20).into_iter().map(|hash| stored_block(&source, hash)).collect();

    let consensus = test_consensus();
    std::thread::scope(|scope| {
        let writer = scope.spawn(|| {
            for block in blocks.iter() {
                assert_eq!(consensus.add_block(block.clone()).unwrap(), BlockStatus::Active);
            }
        });
        for block in blocks.iter() {
            let outpoint = coinbase_outpoint(block);
            loop {
                let finished = writer.is_finished();
                if consensus.get_virtual_utxo(&outpoint).unwrap().is_some() {
                    break;
                }
                assert!(!finished, "coinbase of block {} never reached the virtual UTXO set", block.hash());
                std::thread::yield_now();
            }
            // Once the coinbase shows up, the published virtual already sits on top of its block
            assert!(consensus.virtual_state().ghostdag_data.blue_score > block.header.blue_score);
        }
    });
}
