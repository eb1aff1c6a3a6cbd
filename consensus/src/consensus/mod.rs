//! Consensus rules over the block DAG
//!
//! This module holds the ordering and validation algorithms: GHOSTDAG,
//! reachability, difficulty, the validators and the storage they read from.

pub mod dag;
pub mod difficulty;
pub mod ghostdag;
pub mod storage;
pub mod validation;

pub use dag::SelectedChainIndex;
pub use difficulty::{DifficultyManager, DifficultyWindow};
pub use ghostdag::{GhostdagManager, GhostdagProtocol};
pub use storage::{ConsensusReader, ConsensusStorage, StagingArea, UtxoStateCursor};
pub use validation::{BlockValidator, ExpectedHeaderFields, HeaderValidator, TransactionValidator};
