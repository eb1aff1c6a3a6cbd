use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_REACHABILITY};
use crate::{Database, DbResult};
use consensus_core::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityData {
    /// Longest parent path to genesis
    pub height: u64,
}

pub struct ReachabilityStore {
    access: CachedDbAccess<Hash, ReachabilityData>,
}

impl ReachabilityStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_REACHABILITY, cache_size) }
    }

    pub fn get_height(&self, hash: &Hash) -> DbResult<Option<u64>> {
        Ok(self.access.read(hash)?.map(|data| data.height))
    }

    pub fn stage_insert(&self, batch: &mut WriteBatch, hash: &Hash, height: u64) -> DbResult<()> {
        self.access.stage_write(batch, hash, &ReachabilityData { height })
    }
}
