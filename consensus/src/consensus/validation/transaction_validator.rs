//! Transaction validation for consensus
//!
//! This module validates transactions in two stages:
//! - in isolation: structure, duplicate inputs and output amounts
//! - in UTXO context: input existence, coinbase maturity and value balance

use consensus_core::config::constants::MAX_SOMPI;
use consensus_core::errors::{ConsensusResult, TxResult, TxRuleError};
use consensus_core::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::UtxoView;
use std::collections::HashSet;

/// A transaction together with the UTXO entries its inputs refer to
pub struct PopulatedTransaction<'a> {
    pub tx: &'a Transaction,
    /// One slot per input, `None` for outpoints missing from the view
    pub entries: Vec<Option<UtxoEntry>>,
    /// The first output of `tx` that already exists in the view
    pub existing_output: Option<TransactionOutpoint>,
}

impl<'a> PopulatedTransaction<'a> {
    pub fn populate<V: UtxoView + ?Sized>(tx: &'a Transaction, view: &V) -> ConsensusResult<Self> {
        let mut entries = Vec::with_capacity(tx.inputs.len());
        for input in tx.inputs.iter() {
            entries.push(view.get(&input.previous_outpoint)?);
        }
        let tx_id = tx.id();
        let mut existing_output = None;
        for index in 0..tx.outputs.len() as u32 {
            let outpoint = TransactionOutpoint::new(tx_id, index);
            if view.get(&outpoint)?.is_some() {
                existing_output = Some(outpoint);
                break;
            }
        }
        Ok(Self { tx, entries, existing_output })
    }
}

/// Transaction validator for consensus rules
pub struct TransactionValidator {
    coinbase_maturity: u64,
}

impl TransactionValidator {
    pub fn new(coinbase_maturity: u64) -> Self {
        Self { coinbase_maturity }
    }

    /// Context-free checks
    pub fn validate_tx_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        if tx.is_coinbase() {
            if !tx.inputs.is_empty() {
                return Err(TxRuleError::CoinbaseHasInputs);
            }
        } else {
            if tx.inputs.is_empty() {
                return Err(TxRuleError::NoTxInputs);
            }
            if tx.outputs.is_empty() {
                return Err(TxRuleError::NoTxOutputs);
            }
            let mut seen = HashSet::with_capacity(tx.inputs.len());
            for input in tx.inputs.iter() {
                if !seen.insert(input.previous_outpoint) {
                    return Err(TxRuleError::TxDuplicateInputs(input.previous_outpoint));
                }
            }
        }
        self.check_output_values(tx)
    }

    fn check_output_values(&self, tx: &Transaction) -> TxResult<()> {
        let mut total: u64 = 0;
        for output in tx.outputs.iter() {
            if output.value > MAX_SOMPI {
                return Err(TxRuleError::TxOutTooHigh(output.value));
            }
            total = total.checked_add(output.value).ok_or(TxRuleError::OutputsValueOverflow)?;
            if total > MAX_SOMPI {
                return Err(TxRuleError::OutputsValueOverflow);
            }
        }
        Ok(())
    }

    /// Checks a populated transaction at the point of view of `pov_daa_score`, returning the
    /// spent entries in input order
    pub fn validate_populated_transaction(&self, populated: &PopulatedTransaction, pov_daa_score: u64) -> TxResult<Vec<UtxoEntry>> {
        let tx = populated.tx;
        let mut spent = Vec::with_capacity(populated.entries.len());
        for (input, entry) in tx.inputs.iter().zip(populated.entries.iter()) {
            match entry {
                Some(entry) => spent.push(entry.clone()),
                None => return Err(TxRuleError::MissingTxOutpoints(input.previous_outpoint)),
            }
        }

        let mut total_in: u64 = 0;
        for (input, entry) in tx.inputs.iter().zip(spent.iter()) {
            if entry.is_coinbase && pov_daa_score < entry.block_daa_score.saturating_add(self.coinbase_maturity) {
                return Err(TxRuleError::ImmatureCoinbaseSpend(input.previous_outpoint, entry.block_daa_score, pov_daa_score));
            }
            total_in = total_in.checked_add(entry.amount).ok_or(TxRuleError::InputAmountOverflow)?;
            if total_in > MAX_SOMPI {
                return Err(TxRuleError::InputAmountOverflow);
            }
        }

        if !tx.is_coinbase() {
            let total_out = tx.total_output_value().ok_or(TxRuleError::OutputsValueOverflow)?;
            if total_out > total_in {
                return Err(TxRuleError::SpendTooHigh(total_out, total_in));
            }
        }

        if let Some(outpoint) = populated.existing_output {
            return Err(TxRuleError::OutputAlreadyExists(outpoint));
        }
        Ok(spent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};
    use consensus_core::tx::{ScriptPublicKey, TransactionInput, TransactionOutput};
    use consensus_core::utxo::UtxoCollection;
    use consensus_core::Hash;

    fn tx(inputs: Vec<TransactionOutpoint>, outputs: Vec<u64>) -> Transaction {
        Transaction::new(
            0,
            inputs.into_iter().map(|op| TransactionInput::new(op, vec![], 0, 1)).collect(),
            outputs.into_iter().map(|v| TransactionOutput::new(v, ScriptPublicKey::default())).collect(),
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    fn outpoint(i: u64) -> TransactionOutpoint {
        TransactionOutpoint::new(Hash::from_u64_word(i), 0)
    }

    #[test]
    fn test_isolation_rules() {
        let validator = TransactionValidator::new(10);
        assert_eq!(validator.validate_tx_in_isolation(&tx(vec![], vec![1])), Err(TxRuleError::NoTxInputs));
        assert_eq!(validator.validate_tx_in_isolation(&tx(vec![outpoint(1)], vec![])), Err(TxRuleError::NoTxOutputs));
        assert_eq!(
            validator.validate_tx_in_isolation(&tx(vec![outpoint(1), outpoint(1)], vec![1])),
            Err(TxRuleError::TxDuplicateInputs(outpoint(1)))
        );
        assert_eq!(
            validator.validate_tx_in_isolation(&tx(vec![outpoint(1)], vec![MAX_SOMPI + 1])),
            Err(TxRuleError::TxOutTooHigh(MAX_SOMPI + 1))
        );
        assert_eq!(
            validator.validate_tx_in_isolation(&tx(vec![outpoint(1)], vec![MAX_SOMPI, 1])),
            Err(TxRuleError::OutputsValueOverflow)
        );

        let mut coinbase = tx(vec![outpoint(1)], vec![5]);
        coinbase.subnetwork_id = SUBNETWORK_ID_COINBASE;
        coinbase.finalize();
        assert_eq!(validator.validate_tx_in_isolation(&coinbase), Err(TxRuleError::CoinbaseHasInputs));
        validator.validate_tx_in_isolation(&tx(vec![outpoint(1)], vec![5])).unwrap();
    }

    #[test]
    fn test_utxo_context_rules() {
        let validator = TransactionValidator::new(10);
        let mut view = UtxoCollection::new();
        view.insert(outpoint(1), UtxoEntry::new(100, ScriptPublicKey::default(), 5, true));
        view.insert(outpoint(2), UtxoEntry::new(50, ScriptPublicKey::default(), 5, false));

        let spend = tx(vec![outpoint(1), outpoint(2)], vec![150]);
        let populated = PopulatedTransaction::populate(&spend, &view).unwrap();
        assert_eq!(
            validator.validate_populated_transaction(&populated, 14),
            Err(TxRuleError::ImmatureCoinbaseSpend(outpoint(1), 5, 14))
        );
        assert_eq!(validator.validate_populated_transaction(&populated, 15).unwrap().len(), 2);

        let overspend = tx(vec![outpoint(2)], vec![51]);
        let populated = PopulatedTransaction::populate(&overspend, &view).unwrap();
        assert_eq!(validator.validate_populated_transaction(&populated, 15), Err(TxRuleError::SpendTooHigh(51, 50)));

        let missing = tx(vec![outpoint(3)], vec![1]);
        let populated = PopulatedTransaction::populate(&missing, &view).unwrap();
        assert_eq!(validator.validate_populated_transaction(&populated, 15), Err(TxRuleError::MissingTxOutpoints(outpoint(3))));

        // Fees are allowed, and recreating an existing output is not
        let fee_paying = tx(vec![outpoint(2)], vec![40]);
        view.insert(TransactionOutpoint::new(fee_paying.id(), 0), UtxoEntry::new(1, ScriptPublicKey::default(), 1, false));
        let populated = PopulatedTransaction::populate(&fee_paying, &view).unwrap();
        assert_eq!(
            validator.validate_populated_transaction(&populated, 15),
            Err(TxRuleError::OutputAlreadyExists(TransactionOutpoint::new(fee_paying.id(), 0)))
        );
    }
}
