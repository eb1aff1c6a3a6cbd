use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_BLOCKS};
use crate::{Database, DbResult};
use consensus_core::block::BlockBody;
use consensus_core::Hash;
use std::sync::Arc;

/// Block bodies. Deleted when the block falls below the pruning point.
pub struct BlockStore {
    access: CachedDbAccess<Hash, BlockBody>,
}

impl BlockStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_BLOCKS, cache_size) }
    }

    pub fn get(&self, hash: &Hash) -> DbResult<Option<Arc<BlockBody>>> {
        self.access.read(hash)
    }

    pub fn has(&self, hash: &Hash) -> DbResult<bool> {
        self.access.has(hash)
    }

    pub fn stage_insert(&self, batch: &mut WriteBatch, hash: &Hash, body: &BlockBody) -> DbResult<()> {
        self.access.stage_write(batch, hash, body)
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, hash: &Hash) {
        self.access.stage_delete(batch, hash)
    }
}
