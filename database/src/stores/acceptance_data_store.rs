use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_ACCEPTANCE};
use crate::{Database, DbResult};
use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::Hash;
use std::sync::Arc;

pub struct AcceptanceDataStore {
    access: CachedDbAccess<Hash, AcceptanceData>,
}

impl AcceptanceDataStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_ACCEPTANCE, cache_size) }
    }

    pub fn get(&self, hash: &Hash) -> DbResult<Option<Arc<AcceptanceData>>> {
        self.access.read(hash)
    }

    pub fn stage_insert(&self, batch: &mut WriteBatch, hash: &Hash, data: &AcceptanceData) -> DbResult<()> {
        self.access.stage_write(batch, hash, data)
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, hash: &Hash) {
        self.access.stage_delete(batch, hash)
    }
}
