use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_STATUSES};
use crate::{Database, DbResult};
use consensus_core::blockstatus::BlockStatus;
use consensus_core::Hash;
use std::sync::Arc;

/// Block statuses change over time, so reads always go to the store
pub struct StatusStore {
    access: CachedDbAccess<Hash, BlockStatus>,
}

impl StatusStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { access: CachedDbAccess::new(db, CF_STATUSES, 0) }
    }

    /// Returns [`BlockStatus::Unknown`] for blocks never stored
    pub fn get(&self, hash: &Hash) -> DbResult<BlockStatus> {
        Ok(self.access.read(hash)?.map(|status| *status).unwrap_or(BlockStatus::Unknown))
    }

    pub fn stage_set(&self, batch: &mut WriteBatch, hash: &Hash, status: BlockStatus) -> DbResult<()> {
        self.access.stage_write(batch, hash, &status)
    }

    pub fn collect_all(&self) -> DbResult<Vec<BlockStatus>> {
        self.access.collect_values()
    }
}
