use consensus_core::errors::ConsensusError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    #[error("Database is closed")]
    DatabaseClosed,
}

pub type DbResult<T> = Result<T, DbError>;

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Storage failures are never a verdict on the block, so they surface as internal errors
impl From<DbError> for ConsensusError {
    fn from(err: DbError) -> Self {
        ConsensusError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_are_internal() {
        let err: ConsensusError = DbError::NotFound("header".into()).into();
        assert!(!err.is_rule_error());
        assert_eq!(err.to_string(), "internal error: Key not found: header");
    }
}
