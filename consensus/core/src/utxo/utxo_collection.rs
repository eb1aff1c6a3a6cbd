use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ConsensusResult;
use crate::tx::{TransactionOutpoint, UtxoEntry};
use crate::utxo::UtxoView;

/// In-memory map from outpoint to entry, used for diffs and small sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoCollection {
    utxos: HashMap<TransactionOutpoint, UtxoEntry>,
}

impl UtxoCollection {
    pub fn new() -> Self {
        Self { utxos: HashMap::new() }
    }

    pub fn contains(&self, outpoint: &TransactionOutpoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    pub fn get(&self, outpoint: &TransactionOutpoint) -> Option<&UtxoEntry> {
        self.utxos.get(outpoint)
    }

    /// Insert a new UTXO entry (overwrites if exists)
    pub fn insert(&mut self, outpoint: TransactionOutpoint, entry: UtxoEntry) -> Option<UtxoEntry> {
        self.utxos.insert(outpoint, entry)
    }

    pub fn remove(&mut self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        self.utxos.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransactionOutpoint, &UtxoEntry)> {
        self.utxos.iter()
    }

    /// Sum of all amounts in the collection
    pub fn total_supply(&self) -> u128 {
        self.utxos.values().map(|e| e.amount as u128).sum()
    }

    pub fn total_coinbase_supply(&self) -> u128 {
        self.utxos.values().filter(|e| e.is_coinbase).map(|e| e.amount as u128).sum()
    }
}

impl FromIterator<(TransactionOutpoint, UtxoEntry)> for UtxoCollection {
    fn from_iter<I: IntoIterator<Item = (TransactionOutpoint, UtxoEntry)>>(iter: I) -> Self {
        Self { utxos: iter.into_iter().collect() }
    }
}

impl IntoIterator for UtxoCollection {
    type Item = (TransactionOutpoint, UtxoEntry);
    type IntoIter = std::collections::hash_map::IntoIter<TransactionOutpoint, UtxoEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.utxos.into_iter()
    }
}

impl UtxoView for UtxoCollection {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        Ok(self.utxos.get(outpoint).cloned())
    }
}
