use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_GHOSTDAG};
use crate::{Database, DbResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::Hash;
use std::sync::Arc;

pub struct GhostdagStore {
    access: CachedDbAccess<Hash, GhostdagData>,
}

impl GhostdagStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_GHOSTDAG, cache_size) }
    }

    pub fn get(&self, hash: &Hash) -> DbResult<Option<Arc<GhostdagData>>> {
        self.access.read(hash)
    }

    pub fn has(&self, hash: &Hash) -> DbResult<bool> {
        self.access.has(hash)
    }

    /// GHOSTDAG data is write-once. Callers must not stage a second record for the same block.
    pub fn stage_insert(&self, batch: &mut WriteBatch, hash: &Hash, data: &GhostdagData) -> DbResult<()> {
        self.access.stage_write(batch, hash, data)
    }
}
