//! Consensus library for BlockDAG-based blockchain
//!
//! This library implements the Stokes consensus engine: GHOSTDAG ordering,
//! difficulty and subsidy rules, the virtual UTXO state with reorgs, pruning
//! and the pruning point proof, behind the [`Consensus`] facade.

pub mod consensus;
pub mod engine;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub(crate) mod testutils;

pub use consensus::dag::SelectedChainIndex;
pub use consensus::difficulty::DifficultyManager;
pub use consensus::ghostdag::GhostdagManager;
pub use consensus::storage::{ConsensusReader, ConsensusStorage, StagingArea};
pub use consensus::validation::{BlockValidator, HeaderValidator, TransactionValidator};
pub use consensus_core::Hash;
pub use engine::Consensus;
pub use pipeline::flow::ProcessQueue;
pub use pipeline::{VirtualProcessor, VirtualState};
