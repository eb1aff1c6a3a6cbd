use crate::block::Block;
use crate::coinbase::{CoinbaseData, MinerData};
use crate::config::constants::{BLOCK_VERSION, TX_VERSION};
use crate::header::Header;
use crate::merkle::calc_hash_merkle_root;
use crate::muhash::EMPTY_MUHASH;
use crate::pow::calc_work;
use crate::subnets::SUBNETWORK_ID_COINBASE;
use crate::tx::Transaction;
use crate::{Hash, ZERO_HASH};

/// Static per-network genesis data. The genesis coinbase pays no outputs.
#[derive(Clone, Debug)]
pub struct GenesisBlock {
    pub version: u16,
    pub timestamp: u64,
    pub bits: u32,
    pub nonce: u64,
    pub subsidy: u64,
    pub coinbase_extra_data: &'static [u8],
}

impl GenesisBlock {
    pub fn coinbase_transaction(&self) -> Transaction {
        let payload = CoinbaseData::new(0, self.subsidy, MinerData::new(Default::default(), self.coinbase_extra_data.to_vec()))
            .serialize()
            .unwrap_or_default();
        Transaction::new(TX_VERSION, Vec::new(), Vec::new(), 0, SUBNETWORK_ID_COINBASE, 0, payload)
    }

    pub fn header(&self) -> Header {
        let coinbase = self.coinbase_transaction();
        Header::new_finalized(
            self.version,
            Vec::new(),
            calc_hash_merkle_root(std::iter::once(&coinbase)),
            ZERO_HASH,
            EMPTY_MUHASH.finalize(),
            self.timestamp,
            self.bits,
            self.nonce,
            0,
            calc_work(self.bits),
            0,
            ZERO_HASH,
        )
    }

    pub fn hash(&self) -> Hash {
        self.header().hash
    }

    pub fn build_block(&self) -> Block {
        Block::new(self.header(), vec![self.coinbase_transaction()])
    }
}

pub const GENESIS: GenesisBlock = GenesisBlock {
    version: BLOCK_VERSION,
    timestamp: 1_760_309_945_665,
    bits: 0x1e7fffff,
    nonce: 0,
    subsidy: 50 * crate::config::constants::SOMPI_PER_STOKES,
    coinbase_extra_data: b"stokes-mainnet",
};

pub const TESTNET_GENESIS: GenesisBlock = GenesisBlock { coinbase_extra_data: b"stokes-testnet", ..GENESIS };

pub const SIMNET_GENESIS: GenesisBlock = GenesisBlock { bits: 0x207fffff, coinbase_extra_data: b"stokes-simnet", ..GENESIS };

pub const DEVNET_GENESIS: GenesisBlock =
    GenesisBlock { bits: 0x207fffff, subsidy: 792_202, coinbase_extra_data: b"stokes-devnet", ..GENESIS };

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::params::Params;
    use crate::network::NetworkType;

    #[test]
    fn test_genesis_hashes_are_distinct_and_stable() {
        let hashes: Vec<Hash> = NetworkType::iter().map(|n| Params::from(n).genesis.hash()).collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in hashes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_eq!(GENESIS.hash(), GENESIS.build_block().hash());
    }

    #[test]
    fn test_genesis_coinbase() {
        let block = SIMNET_GENESIS.build_block();
        let coinbase = &block.transactions[0];
        assert!(coinbase.is_coinbase());
        assert!(coinbase.outputs.is_empty());
        let data = CoinbaseData::deserialize(&coinbase.payload).unwrap();
        assert_eq!(data.blue_score, 0);
        assert_eq!(data.subsidy, SIMNET_GENESIS.subsidy);
        assert_eq!(block.header.utxo_commitment, EMPTY_MUHASH.finalize());
    }
}
