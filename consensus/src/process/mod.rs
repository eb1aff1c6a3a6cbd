//! Consensus processes built on top of the DAG
//!
//! Subsidy and coinbase rules, past median time, parents by level, pruning,
//! the pruning point proof and block template building.

pub mod coinbase;
pub mod mining;
pub mod parents_builder;
pub mod past_median_time;
pub mod pruning;
pub mod pruning_proof;

pub use coinbase::CoinbaseManager;
pub use mining::BlockTemplateBuilder;
pub use parents_builder::ParentsManager;
pub use past_median_time::PastMedianTimeManager;
pub use pruning::PruningManager;
pub use pruning_proof::PruningProofManager;
