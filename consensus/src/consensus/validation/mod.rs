//! Validation module for consensus
//!
//! This module provides validation for blocks, headers, and transactions,
//! both in isolation and in the context of the DAG and the UTXO set.

pub mod block_validator;
pub mod header_validator;
pub mod transaction_validator;

pub use block_validator::BlockValidator;
pub use header_validator::{ExpectedHeaderFields, HeaderValidator};
pub use transaction_validator::{PopulatedTransaction, TransactionValidator};
