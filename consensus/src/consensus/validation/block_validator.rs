//! Block validation for consensus
//!
//! Structural checks that need nothing but the block itself. They run before
//! the block enters the serialized processing section.

use consensus_core::block::Block;
use consensus_core::errors::{BlockProcessResult, RuleError};
use consensus_core::mass::MassCalculator;
use consensus_core::merkle::calc_hash_merkle_root;
use std::collections::HashSet;
use std::sync::Arc;

use super::header_validator::HeaderValidator;
use super::transaction_validator::TransactionValidator;

/// Block validator for consensus rules
pub struct BlockValidator {
    max_block_mass: u64,
    max_coinbase_payload_len: usize,
    mass_calculator: MassCalculator,
    header_validator: Arc<HeaderValidator>,
    transaction_validator: Arc<TransactionValidator>,
}

impl BlockValidator {
    pub fn new(
        max_block_mass: u64,
        max_coinbase_payload_len: usize,
        mass_calculator: MassCalculator,
        header_validator: Arc<HeaderValidator>,
        transaction_validator: Arc<TransactionValidator>,
    ) -> Self {
        Self { max_block_mass, max_coinbase_payload_len, mass_calculator, header_validator, transaction_validator }
    }

    /// Header and body checks in isolation. `now` is the local clock in milliseconds.
    pub fn validate_block_in_isolation(&self, block: &Block, now: u64) -> BlockProcessResult<()> {
        self.header_validator.validate_header_in_isolation(&block.header, now)?;
        self.validate_body_in_isolation(block)
    }

    pub fn validate_body_in_isolation(&self, block: &Block) -> BlockProcessResult<()> {
        let Some(coinbase) = block.transactions.first() else {
            return Err(RuleError::NoTransactions);
        };
        if !coinbase.is_coinbase() {
            return Err(RuleError::FirstTxNotCoinbase);
        }
        if let Some(index) = block.transactions.iter().skip(1).position(|tx| tx.is_coinbase()) {
            return Err(RuleError::MultipleCoinbases(index + 1));
        }
        if coinbase.payload.len() > self.max_coinbase_payload_len {
            return Err(RuleError::BadCoinbasePayloadLen(coinbase.payload.len(), self.max_coinbase_payload_len));
        }

        let merkle_root = calc_hash_merkle_root(block.transactions.iter());
        if merkle_root != block.header.hash_merkle_root {
            return Err(RuleError::BadMerkleRoot(block.header.hash_merkle_root, merkle_root));
        }

        let mut ids = HashSet::with_capacity(block.transactions.len());
        for tx in block.transactions.iter() {
            if !ids.insert(tx.id()) {
                return Err(RuleError::DuplicateTransactions(tx.id()));
            }
            self.transaction_validator
                .validate_tx_in_isolation(tx)
                .map_err(|err| RuleError::TxInIsolationValidationFailed(tx.id(), err))?;
        }

        let mass = self.mass_calculator.calc_block_mass(block.transactions.iter());
        if mass > self.max_block_mass {
            return Err(RuleError::ExceedsMassLimit(mass, self.max_block_mass));
        }
        Ok(())
    }
}
