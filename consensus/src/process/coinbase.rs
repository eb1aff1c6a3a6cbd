//! Coinbase transaction processing
//!
//! This module handles the halving subsidy schedule, coinbase construction
//! for new blocks and contextual coinbase validation. Transaction fees are
//! not paid to the miner: a coinbase pays exactly the block subsidy.

use consensus_core::coinbase::{CoinbaseData, MinerData};
use consensus_core::config::constants::TX_VERSION;
use consensus_core::errors::{BlockProcessResult, RuleError};
use consensus_core::subnets::SUBNETWORK_ID_COINBASE;
use consensus_core::tx::{Transaction, TransactionOutput};
use consensus_core::Hash;

/// Halvings past this count shift the whole subsidy out
const MAX_HALVINGS: u64 = 64;

/// Coinbase and subsidy rules
pub struct CoinbaseManager {
    genesis_hash: Hash,
    base_subsidy: u64,
    genesis_subsidy: u64,
    halving_interval_daa_score: u64,
    max_coinbase_payload_len: usize,
}

impl CoinbaseManager {
    pub fn new(
        genesis_hash: Hash,
        base_subsidy: u64,
        genesis_subsidy: u64,
        halving_interval_daa_score: u64,
        max_coinbase_payload_len: usize,
    ) -> Self {
        Self { genesis_hash, base_subsidy, genesis_subsidy, halving_interval_daa_score, max_coinbase_payload_len }
    }

    /// Subsidy of the block `hash` at `daa_score`
    pub fn calc_block_subsidy(&self, hash: Hash, daa_score: u64) -> u64 {
        if hash == self.genesis_hash {
            return self.genesis_subsidy;
        }
        self.calc_subsidy_at(daa_score)
    }

    /// The halving schedule: `base_subsidy >> (daa_score / halving_interval)`, zero from the 64th era on
    pub fn calc_subsidy_at(&self, daa_score: u64) -> u64 {
        let halvings = daa_score / self.halving_interval_daa_score;
        if halvings >= MAX_HALVINGS {
            return 0;
        }
        self.base_subsidy >> halvings
    }

    /// Builds the coinbase of a new block. A zero subsidy produces a coinbase without outputs.
    pub fn build_coinbase_transaction(&self, blue_score: u64, subsidy: u64, miner_data: MinerData) -> BlockProcessResult<Transaction> {
        let outputs = if subsidy > 0 {
            vec![TransactionOutput::new(subsidy, miner_data.script_public_key.clone())]
        } else {
            vec![]
        };
        let payload = CoinbaseData::new(blue_score, subsidy, miner_data).serialize()?;
        if payload.len() > self.max_coinbase_payload_len {
            return Err(RuleError::BadCoinbasePayloadLen(payload.len(), self.max_coinbase_payload_len));
        }
        Ok(Transaction::new(TX_VERSION, vec![], outputs, 0, SUBNETWORK_ID_COINBASE, 0, payload))
    }

    /// Checks the coinbase against the block's blue score and the subsidy due at its DAA score
    pub fn validate_coinbase_in_context(&self, coinbase: &Transaction, hash: Hash, blue_score: u64, daa_score: u64) -> BlockProcessResult<()> {
        let data = CoinbaseData::deserialize(&coinbase.payload)?;
        if data.blue_score != blue_score {
            return Err(RuleError::BadCoinbasePayloadBlueScore(data.blue_score, blue_score));
        }
        let expected_subsidy = self.calc_block_subsidy(hash, daa_score);
        if data.subsidy != expected_subsidy {
            return Err(RuleError::BadCoinbaseSubsidy(data.subsidy, expected_subsidy));
        }
        let paid = coinbase.total_output_value().unwrap_or(u64::MAX);
        if paid != expected_subsidy {
            return Err(RuleError::BadCoinbaseOutputs(paid, expected_subsidy));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::config::constants::SOMPI_PER_STOKES;
    use consensus_core::config::params::Params;
    use consensus_core::tx::ScriptPublicKey;

    fn manager(params: &Params) -> CoinbaseManager {
        CoinbaseManager::new(
            params.genesis.hash(),
            params.base_subsidy,
            params.genesis_subsidy,
            params.halving_interval_daa_score,
            params.max_coinbase_payload_len,
        )
    }

    #[test]
    fn test_halving_schedule() {
        let params = Params::mainnet();
        let manager = manager(&params);
        let interval = params.halving_interval_daa_score;
        assert_eq!(manager.calc_subsidy_at(0), 50 * SOMPI_PER_STOKES);
        assert_eq!(manager.calc_subsidy_at(interval - 1), 50 * SOMPI_PER_STOKES);
        assert_eq!(manager.calc_subsidy_at(interval), 25 * SOMPI_PER_STOKES);
        assert_eq!(manager.calc_subsidy_at(interval * 2), 1_250_000_000);
        assert_eq!(manager.calc_subsidy_at(interval * 64), 0);
        assert_eq!(manager.calc_subsidy_at(u64::MAX), 0);
        assert_eq!(manager.calc_block_subsidy(params.genesis.hash(), interval * 70), params.genesis_subsidy);
    }

    #[test]
    fn test_subsidy_is_non_increasing() {
        let params = Params::devnet();
        let manager = manager(&params);
        let mut previous = u64::MAX;
        for era in 0..70u64 {
            let subsidy = manager.calc_subsidy_at(era * params.halving_interval_daa_score);
            assert!(subsidy <= previous);
            previous = subsidy;
        }
    }

    #[test]
    fn test_total_emission() {
        let params = Params::mainnet();
        let manager = manager(&params);
        let total: u128 = (0..MAX_HALVINGS)
            .map(|era| manager.calc_subsidy_at(era * params.halving_interval_daa_score) as u128 * params.halving_interval_daa_score as u128)
            .sum();
        let ideal = params.base_subsidy as u128 * params.halving_interval_daa_score as u128 * 2;
        assert!(total <= ideal);
        assert_eq!(total / SOMPI_PER_STOKES as u128, 12_623_039_986);
    }

    #[test]
    fn test_coinbase_round_trip_and_rejections() {
        let params = Params::simnet();
        let manager = manager(&params);
        let miner = MinerData::new(ScriptPublicKey::from_vec(0, vec![1, 2, 3]), b"miner".to_vec());
        let hash = Hash::from_u64_word(77);
        let subsidy = manager.calc_block_subsidy(hash, 10);
        let coinbase = manager.build_coinbase_transaction(4, subsidy, miner.clone()).unwrap();
        assert!(coinbase.is_coinbase());
        manager.validate_coinbase_in_context(&coinbase, hash, 4, 10).unwrap();

        assert_eq!(
            manager.validate_coinbase_in_context(&coinbase, hash, 5, 10),
            Err(RuleError::BadCoinbasePayloadBlueScore(4, 5))
        );

        let greedy = manager.build_coinbase_transaction(4, subsidy + 1, miner).unwrap();
        assert_eq!(
            manager.validate_coinbase_in_context(&greedy, hash, 4, 10),
            Err(RuleError::BadCoinbaseSubsidy(subsidy + 1, subsidy))
        );
    }
}
