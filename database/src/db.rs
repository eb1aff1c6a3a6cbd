use crate::errors::{DbError, DbResult};
use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, DB};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const CF_HEADERS: &str = "headers";
pub const CF_BLOCKS: &str = "block_bodies";
pub const CF_GHOSTDAG: &str = "ghostdag";
pub const CF_STATUSES: &str = "statuses";
pub const CF_REACHABILITY: &str = "reachability";
pub const CF_UTXO_DIFFS: &str = "utxo_diffs";
pub const CF_ACCEPTANCE: &str = "acceptance_data";
pub const CF_UTXOS: &str = "virtual_utxos";
pub const CF_METADATA: &str = "metadata";

pub const ALL_COLUMN_FAMILIES: [&str; 9] =
    [CF_HEADERS, CF_BLOCKS, CF_GHOSTDAG, CF_STATUSES, CF_REACHABILITY, CF_UTXO_DIFFS, CF_ACCEPTANCE, CF_UTXOS, CF_METADATA];

type MemoryColumns = HashMap<&'static str, BTreeMap<Vec<u8>, Vec<u8>>>;

enum Backend {
    RocksDb(DB),
    Memory(RwLock<MemoryColumns>),
}

enum BatchOp {
    Put { cf: &'static str, key: Vec<u8>, value: Vec<u8> },
    Delete { cf: &'static str, key: Vec<u8> },
}

/// A set of writes committed atomically by [`Database::write_batch`]
#[derive(Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, cf: &'static str, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { cf, key, value });
    }

    pub fn delete(&mut self, cf: &'static str, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { cf, key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Key-value store with named column families, backed by RocksDB or by memory
pub struct Database {
    backend: Backend,
    is_closed: AtomicBool,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Arc<Self>> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(10000);
        opts.set_keep_log_file_num(10);
        opts.set_max_background_jobs(4);
        opts.set_bytes_per_sync(1048576);
        opts.increase_parallelism(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);

        let cf_descriptors: Vec<_> =
            ALL_COLUMN_FAMILIES.iter().map(|name| ColumnFamilyDescriptor::new(*name, Options::default())).collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)?;
        info!(path = %path.as_ref().display(), "opened rocksdb store");
        Ok(Arc::new(Self { backend: Backend::RocksDb(db), is_closed: AtomicBool::new(false) }))
    }

    /// Volatile store used by tests and tooling
    pub fn in_memory() -> Arc<Self> {
        let columns = ALL_COLUMN_FAMILIES.iter().map(|cf| (*cf, BTreeMap::new())).collect();
        Arc::new(Self { backend: Backend::Memory(RwLock::new(columns)), is_closed: AtomicBool::new(false) })
    }

    fn check_closed(&self) -> DbResult<()> {
        if self.is_closed.load(Ordering::Acquire) {
            return Err(DbError::DatabaseClosed);
        }
        Ok(())
    }

    fn cf_handle<'a>(db: &'a DB, cf_name: &str) -> DbResult<&'a rocksdb::ColumnFamily> {
        db.cf_handle(cf_name).ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    pub fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_closed()?;
        match &self.backend {
            Backend::RocksDb(db) => Ok(db.get_cf(Self::cf_handle(db, cf_name)?, key)?),
            Backend::Memory(columns) => {
                let columns = columns.read();
                let column = columns.get(cf_name).ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))?;
                Ok(column.get(key).cloned())
            }
        }
    }

    pub fn exists(&self, cf_name: &str, key: &[u8]) -> DbResult<bool> {
        self.check_closed()?;
        match &self.backend {
            Backend::RocksDb(db) => Ok(db.get_pinned_cf(Self::cf_handle(db, cf_name)?, key)?.is_some()),
            Backend::Memory(_) => Ok(self.get(cf_name, key)?.is_some()),
        }
    }

    pub fn put(&self, cf_name: &'static str, key: &[u8], value: &[u8]) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.put(cf_name, key.to_vec(), value.to_vec());
        self.write_batch(batch)
    }

    /// Commits all writes of `batch` atomically. Either every write is persisted or none is.
    pub fn write_batch(&self, batch: WriteBatch) -> DbResult<()> {
        self.check_closed()?;
        let op_count = batch.len();
        match &self.backend {
            Backend::RocksDb(db) => {
                let mut rocks_batch = rocksdb::WriteBatch::default();
                for op in batch.ops {
                    match op {
                        BatchOp::Put { cf, key, value } => rocks_batch.put_cf(Self::cf_handle(db, cf)?, key, value),
                        BatchOp::Delete { cf, key } => rocks_batch.delete_cf(Self::cf_handle(db, cf)?, key),
                    }
                }
                db.write(rocks_batch)?;
            }
            Backend::Memory(columns) => {
                let mut columns = columns.write();
                if let Some(op) = batch.ops.iter().find(|op| !columns.contains_key(op.cf())) {
                    return Err(DbError::ColumnFamilyNotFound(op.cf().to_string()));
                }
                for op in batch.ops {
                    match op {
                        BatchOp::Put { cf, key, value } => {
                            columns.entry(cf).or_default().insert(key, value);
                        }
                        BatchOp::Delete { cf, key } => {
                            columns.entry(cf).or_default().remove(&key);
                        }
                    }
                }
            }
        }
        debug!(op_count, "committed write batch");
        Ok(())
    }

    /// All key-value pairs of a column family in key order
    pub fn collect_cf(&self, cf_name: &str) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_closed()?;
        match &self.backend {
            Backend::RocksDb(db) => {
                let mut pairs = Vec::new();
                for item in db.iterator_cf(Self::cf_handle(db, cf_name)?, IteratorMode::Start) {
                    let (key, value) = item?;
                    pairs.push((key.to_vec(), value.to_vec()));
                }
                Ok(pairs)
            }
            Backend::Memory(columns) => {
                let columns = columns.read();
                let column = columns.get(cf_name).ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))?;
                Ok(column.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
        }
    }

    pub fn count(&self, cf_name: &str) -> DbResult<usize> {
        Ok(self.collect_cf(cf_name)?.len())
    }

    pub fn flush(&self) -> DbResult<()> {
        self.check_closed()?;
        if let Backend::RocksDb(db) = &self.backend {
            db.flush()?;
        }
        Ok(())
    }

    /// Rejects all further access. The underlying handle is released when the last reference drops.
    pub fn close(&self) {
        self.is_closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> String {
        match &self.backend {
            Backend::RocksDb(db) => db.property_value("rocksdb.stats").unwrap_or_default().unwrap_or_default(),
            Backend::Memory(columns) => {
                columns.read().iter().map(|(cf, column)| format!("{cf}: {} keys", column.len())).collect::<Vec<_>>().join("\n")
            }
        }
    }
}

impl BatchOp {
    fn cf(&self) -> &'static str {
        match self {
            BatchOp::Put { cf, .. } | BatchOp::Delete { cf, .. } => cf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(db: &Database) {
        db.put(CF_METADATA, b"k", b"v").unwrap();
        assert_eq!(db.get(CF_METADATA, b"k").unwrap(), Some(b"v".to_vec()));

        let mut batch = WriteBatch::new();
        batch.put(CF_HEADERS, b"a".to_vec(), b"1".to_vec());
        batch.put(CF_HEADERS, b"b".to_vec(), b"2".to_vec());
        batch.delete(CF_METADATA, b"k".to_vec());
        db.write_batch(batch).unwrap();

        assert!(!db.exists(CF_METADATA, b"k").unwrap());
        assert_eq!(db.collect_cf(CF_HEADERS).unwrap(), vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]);
        assert_eq!(db.count(CF_HEADERS).unwrap(), 2);
    }

    #[test]
    fn test_rocksdb_backend() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        exercise(&db);
        db.flush().unwrap();
    }

    #[test]
    fn test_memory_backend() {
        exercise(&Database::in_memory());
    }

    #[test]
    fn test_unknown_column_family_rejects_whole_batch() {
        let db = Database::in_memory();
        let mut batch = WriteBatch::new();
        batch.put(CF_HEADERS, b"a".to_vec(), b"1".to_vec());
        batch.put("nope", b"b".to_vec(), b"2".to_vec());
        assert!(matches!(db.write_batch(batch), Err(DbError::ColumnFamilyNotFound(_))));
        assert!(!db.exists(CF_HEADERS, b"a").unwrap());
    }

    #[test]
    fn test_closed_database() {
        let db = Database::in_memory();
        db.close();
        assert!(matches!(db.get(CF_HEADERS, b"a"), Err(DbError::DatabaseClosed)));
    }
}
