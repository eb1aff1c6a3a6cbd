use crate::access::CachedDbAccess;
use crate::db::{WriteBatch, CF_HEADERS};
use crate::{Database, DbResult};
use consensus_core::header::Header;
use consensus_core::Hash;
use std::sync::Arc;

/// Headers are written once and kept forever, including below the pruning point
pub struct HeaderStore {
    access: CachedDbAccess<Hash, Header>,
}

impl HeaderStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { access: CachedDbAccess::new(db, CF_HEADERS, cache_size) }
    }

    pub fn get(&self, hash: &Hash) -> DbResult<Option<Arc<Header>>> {
        self.access.read(hash)
    }

    pub fn has(&self, hash: &Hash) -> DbResult<bool> {
        self.access.has(hash)
    }

    pub fn stage_insert(&self, batch: &mut WriteBatch, header: &Header) -> DbResult<()> {
        self.access.stage_write(batch, &header.hash, header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::config::genesis::SIMNET_GENESIS;

    #[test]
    fn test_header_round_trip() {
        let db = Database::in_memory();
        let store = HeaderStore::new(db.clone(), 8);
        let header = SIMNET_GENESIS.header();

        let mut batch = WriteBatch::new();
        store.stage_insert(&mut batch, &header).unwrap();
        db.write_batch(batch).unwrap();

        assert!(store.has(&header.hash).unwrap());
        assert_eq!(*store.get(&header.hash).unwrap().unwrap(), header);
        assert!(store.get(&Hash::from_u64_word(1)).unwrap().is_none());
    }
}
