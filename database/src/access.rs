use crate::cache::WriteThroughCache;
use crate::db::WriteBatch;
use crate::{Database, DbResult};
use consensus_core::tx::TransactionOutpoint;
use consensus_core::Hash;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash as StdHash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Keys that map to a stable byte encoding
pub trait DbKey: Clone + Eq + StdHash {
    fn to_db_key(&self) -> Vec<u8>;
}

impl DbKey for Hash {
    fn to_db_key(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl DbKey for TransactionOutpoint {
    fn to_db_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(36);
        key.extend_from_slice(self.transaction_id.as_bytes());
        key.extend_from_slice(&self.index.to_be_bytes());
        key
    }
}

/// Typed, bincode-encoded access to one column family with an optional read cache
pub struct CachedDbAccess<K, V> {
    db: Arc<Database>,
    cf: &'static str,
    cache: WriteThroughCache<K, Arc<V>>,
    _marker: PhantomData<V>,
}

impl<K: DbKey, V: Serialize + DeserializeOwned> CachedDbAccess<K, V> {
    pub fn new(db: Arc<Database>, cf: &'static str, cache_size: usize) -> Self {
        Self { db, cf, cache: WriteThroughCache::new(cache_size), _marker: PhantomData }
    }

    pub fn read(&self, key: &K) -> DbResult<Option<Arc<V>>> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }
        match self.db.get(self.cf, &key.to_db_key())? {
            Some(bytes) => {
                let value = Arc::new(bincode::deserialize::<V>(&bytes)?);
                self.cache.insert(key.clone(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn has(&self, key: &K) -> DbResult<bool> {
        if self.cache.get(key).is_some() {
            return Ok(true);
        }
        self.db.exists(self.cf, &key.to_db_key())
    }

    pub fn stage_write(&self, batch: &mut WriteBatch, key: &K, value: &V) -> DbResult<()> {
        batch.put(self.cf, key.to_db_key(), bincode::serialize(value)?);
        self.cache.remove(key);
        Ok(())
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, key: &K) {
        batch.delete(self.cf, key.to_db_key());
        self.cache.remove(key);
    }

    /// Decodes every value of the column family
    pub fn collect_values(&self) -> DbResult<Vec<V>> {
        self.db.collect_cf(self.cf)?.into_iter().map(|(_, bytes)| Ok(bincode::deserialize::<V>(&bytes)?)).collect()
    }
}
