use crate::db::{WriteBatch, CF_METADATA};
use crate::{Database, DbResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// The virtual state record. Tips, counts and the pruning point all live inside it so that a
/// single put replaces them together.
pub const KEY_VIRTUAL_STATE: &str = "virtual-state";

/// Single typed records keyed by name
pub struct MetadataStore {
    db: Arc<Database>,
}

impl MetadataStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.db.get(CF_METADATA, key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn stage_put<T: Serialize>(&self, batch: &mut WriteBatch, key: &str, value: &T) -> DbResult<()> {
        batch.put(CF_METADATA, key.as_bytes().to_vec(), bincode::serialize(value)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::Hash;

    #[test]
    fn test_typed_records() {
        let db = Database::in_memory();
        let store = MetadataStore::new(db.clone());
        assert_eq!(store.get::<Vec<Hash>>(KEY_VIRTUAL_STATE).unwrap(), None);

        let tips = vec![Hash::from_u64_word(1), Hash::from_u64_word(2)];
        let mut batch = WriteBatch::new();
        store.stage_put(&mut batch, KEY_VIRTUAL_STATE, &tips).unwrap();
        db.write_batch(batch).unwrap();
        assert_eq!(store.get::<Vec<Hash>>(KEY_VIRTUAL_STATE).unwrap(), Some(tips.clone()));

        let mut batch = WriteBatch::new();
        store.stage_put(&mut batch, KEY_VIRTUAL_STATE, &tips[..1].to_vec()).unwrap();
        db.write_batch(batch).unwrap();
        assert_eq!(store.get::<Vec<Hash>>(KEY_VIRTUAL_STATE).unwrap(), Some(vec![tips[0]]));
    }
}
