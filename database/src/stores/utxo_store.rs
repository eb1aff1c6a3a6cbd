use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_UTXOS};
use crate::{Database, DbResult};
use consensus_core::errors::ConsensusResult;
use consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use consensus_core::utxo::{UtxoCollection, UtxoDiff, UtxoView};
use std::sync::Arc;

/// The materialized UTXO set of the virtual. Only updated through staged diffs so that
/// it always matches the persisted virtual state.
pub struct UtxoStore {
    access: CachedDbAccess<TransactionOutpoint, (TransactionOutpoint, UtxoEntry)>,
}

impl UtxoStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { access: CachedDbAccess::new(db, CF_UTXOS, 0) }
    }

    pub fn get(&self, outpoint: &TransactionOutpoint) -> DbResult<Option<UtxoEntry>> {
        Ok(self.access.read(outpoint)?.map(|pair| pair.1.clone()))
    }

    pub fn stage_apply_diff(&self, batch: &mut WriteBatch, diff: &UtxoDiff) -> DbResult<()> {
        for (outpoint, _) in diff.remove.iter() {
            if !diff.add.contains(outpoint) {
                self.access.stage_delete(batch, outpoint);
            }
        }
        for (outpoint, entry) in diff.add.iter() {
            self.access.stage_write(batch, outpoint, &(*outpoint, entry.clone()))?;
        }
        Ok(())
    }

    /// Loads the whole set into memory
    pub fn collect_all(&self) -> DbResult<UtxoCollection> {
        Ok(self.access.collect_values()?.into_iter().collect())
    }
}

impl UtxoView for UtxoStore {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        Ok(UtxoStore::get(self, outpoint)?)
    }
}
