use crate::config::constants::SOMPI_PER_STOKES;
use crate::config::genesis::{GenesisBlock, DEVNET_GENESIS, GENESIS, SIMNET_GENESIS, TESTNET_GENESIS};
use crate::network::NetworkType;
use crate::KType;

/// Consensus parameters. Immutable for the lifetime of a node.
#[derive(Clone, Debug)]
pub struct Params {
    pub network: NetworkType,
    pub genesis: GenesisBlock,

    /// Bound on the blue anticone size of a blue block
    pub ghostdag_k: KType,
    pub mergeset_size_limit: u64,
    pub max_block_parents: u8,
    pub max_block_mass: u64,
    pub max_block_level: u8,

    pub difficulty_adjustment_window_size: usize,
    pub timestamp_deviation_tolerance: u64,
    /// Milliseconds
    pub target_time_per_block: u64,
    /// Milliseconds
    pub finality_duration: u64,
    /// Easiest allowed difficulty, also the genesis difficulty
    pub max_difficulty_bits: u32,
    pub skip_proof_of_work: bool,

    pub pruning_proof_m: u64,
    pub merge_depth: u64,

    pub coinbase_maturity: u64,
    pub max_coinbase_payload_len: usize,
    pub halving_interval_daa_score: u64,
    pub base_subsidy: u64,
    pub genesis_subsidy: u64,

    pub mass_per_tx_byte: u64,
    pub mass_per_script_pub_key_byte: u64,
    pub mass_per_sig_op: u64,
}

impl Params {
    /// Number of blocks a block must be behind the virtual to be considered final
    pub fn finality_depth(&self) -> u64 {
        self.finality_duration / self.target_time_per_block
    }

    /// Blue score depth of the pruning point below the virtual
    pub fn pruning_depth(&self) -> u64 {
        let k = self.ghostdag_k as u64;
        2 * self.finality_depth() + 4 * self.mergeset_size_limit * k + 2 * k + 2
    }

    pub fn past_median_time_window_size(&self) -> usize {
        (2 * self.timestamp_deviation_tolerance - 1) as usize
    }

    /// Milliseconds a block timestamp may be ahead of local time
    pub fn max_future_block_time_offset(&self) -> u64 {
        self.timestamp_deviation_tolerance * self.target_time_per_block
    }

    pub fn expected_daa_window_duration_ms(&self) -> u64 {
        self.difficulty_adjustment_window_size as u64 * self.target_time_per_block
    }

    pub fn mainnet() -> Self {
        Self {
            network: NetworkType::Mainnet,
            genesis: GENESIS,
            ghostdag_k: 18,
            mergeset_size_limit: 180,
            max_block_parents: 10,
            max_block_mass: 500_000,
            max_block_level: crate::config::constants::MAX_BLOCK_LEVEL,
            difficulty_adjustment_window_size: 2641,
            timestamp_deviation_tolerance: 132,
            target_time_per_block: 1000,
            finality_duration: 86_400_000,
            max_difficulty_bits: GENESIS.bits,
            skip_proof_of_work: false,
            pruning_proof_m: 1000,
            merge_depth: 3600,
            coinbase_maturity: 100,
            max_coinbase_payload_len: 204,
            halving_interval_daa_score: 126_230_400,
            base_subsidy: 50 * SOMPI_PER_STOKES,
            genesis_subsidy: 50 * SOMPI_PER_STOKES,
            mass_per_tx_byte: 1,
            mass_per_script_pub_key_byte: 10,
            mass_per_sig_op: 1000,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: NetworkType::Testnet,
            genesis: TESTNET_GENESIS,
            max_difficulty_bits: TESTNET_GENESIS.bits,
            ..Self::mainnet()
        }
    }

    pub fn simnet() -> Self {
        Self {
            network: NetworkType::Simnet,
            genesis: SIMNET_GENESIS,
            max_difficulty_bits: SIMNET_GENESIS.bits,
            skip_proof_of_work: true,
            ..Self::mainnet()
        }
    }

    pub fn devnet() -> Self {
        Self {
            network: NetworkType::Devnet,
            genesis: DEVNET_GENESIS,
            max_difficulty_bits: DEVNET_GENESIS.bits,
            skip_proof_of_work: true,
            target_time_per_block: 20,
            halving_interval_daa_score: 6_311_520_000,
            base_subsidy: 792_202,
            genesis_subsidy: 792_202,
            ..Self::mainnet()
        }
    }
}

impl From<NetworkType> for Params {
    fn from(network: NetworkType) -> Self {
        match network {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Devnet => Self::devnet(),
            NetworkType::Simnet => Self::simnet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantities() {
        let params = Params::mainnet();
        assert_eq!(params.finality_depth(), 86_400);
        assert_eq!(params.pruning_depth(), 2 * 86_400 + 4 * 180 * 18 + 2 * 18 + 2);
        assert_eq!(params.past_median_time_window_size(), 263);
        assert_eq!(params.max_future_block_time_offset(), 132_000);
        assert_eq!(params.expected_daa_window_duration_ms(), 2_641_000);
    }

    #[test]
    fn test_network_overrides() {
        let devnet = Params::from(NetworkType::Devnet);
        assert_eq!(devnet.target_time_per_block, 20);
        assert_eq!(devnet.halving_interval_daa_score, 6_311_520_000);
        assert_eq!(devnet.base_subsidy, 792_202);
        assert_eq!(devnet.finality_depth(), 4_320_000);
        assert!(devnet.skip_proof_of_work);
        assert!(!Params::testnet().skip_proof_of_work);
        assert_eq!(Params::simnet().max_difficulty_bits, 0x207fffff);
        assert_eq!(Params::mainnet().max_difficulty_bits, 0x1e7fffff);
    }
}
