use serde::{Deserialize, Serialize};

use crate::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use crate::utxo::UtxoCollection;

/// The changes a sequence of transactions made to a UTXO set. `remove` holds the
/// entries that were spent so that the diff can be reversed. Applying a diff means
/// removing `remove` and then inserting `add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoDiff {
    pub add: UtxoCollection,
    pub remove: UtxoCollection,
}

impl UtxoDiff {
    pub fn new(add: UtxoCollection, remove: UtxoCollection) -> Self {
        Self { add, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Records the effect of an already validated transaction. `spent_entries` must
    /// hold the entries of `tx.inputs` in order.
    pub fn add_transaction(&mut self, tx: &Transaction, spent_entries: &[UtxoEntry], block_daa_score: u64) {
        for (input, entry) in tx.inputs.iter().zip(spent_entries) {
            self.remove_entry(input.previous_outpoint, entry.clone());
        }
        let is_coinbase = tx.is_coinbase();
        let tx_id = tx.id();
        for (index, output) in tx.outputs.iter().enumerate() {
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), block_daa_score, is_coinbase);
            self.add_entry(TransactionOutpoint::new(tx_id, index as u32), entry);
        }
    }

    fn remove_entry(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) {
        if self.add.remove(&outpoint).is_none() {
            self.remove.insert(outpoint, entry);
        }
    }

    fn add_entry(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) {
        if self.remove.get(&outpoint) == Some(&entry) {
            self.remove.remove(&outpoint);
        } else {
            self.add.insert(outpoint, entry);
        }
    }

    /// Composes `other` on top of `self`, so that applying the result equals applying `self` then `other`
    pub fn with_diff_in_place(&mut self, other: &UtxoDiff) {
        for (outpoint, entry) in other.remove.iter() {
            self.remove_entry(*outpoint, entry.clone());
        }
        for (outpoint, entry) in other.add.iter() {
            self.add_entry(*outpoint, entry.clone());
        }
    }

    pub fn with_diff(&self, other: &UtxoDiff) -> UtxoDiff {
        let mut result = self.clone();
        result.with_diff_in_place(other);
        result
    }

    /// The diff that undoes this one
    pub fn reversed(&self) -> UtxoDiff {
        UtxoDiff { add: self.remove.clone(), remove: self.add.clone() }
    }

    pub fn apply_to(&self, collection: &mut UtxoCollection) {
        for (outpoint, _) in self.remove.iter() {
            collection.remove(outpoint);
        }
        for (outpoint, entry) in self.add.iter() {
            collection.insert(*outpoint, entry.clone());
        }
    }
}
