pub mod access;
pub mod cache;
pub mod db;
pub mod errors;
pub mod stores;

pub use db::{Database, WriteBatch};
pub use errors::{DbError, DbResult};
