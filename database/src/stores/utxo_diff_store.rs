use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_UTXO_DIFFS};
use crate::{Database, DbResult};
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use std::sync::Arc;

/// Per chain block diff against the UTXO state of its selected parent
pub struct UtxoDiffStore {
    access: CachedDbAccess<Hash, UtxoDiff>,
}

impl UtxoDiffStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_UTXO_DIFFS, cache_size) }
    }

    pub fn get(&self, hash: &Hash) -> DbResult<Option<Arc<UtxoDiff>>> {
        self.access.read(hash)
    }

    pub fn stage_insert(&self, batch: &mut WriteBatch, hash: &Hash, diff: &UtxoDiff) -> DbResult<()> {
        self.access.stage_write(batch, hash, diff)
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, hash: &Hash) {
        self.access.stage_delete(batch, hash)
    }
}
