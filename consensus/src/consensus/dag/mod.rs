//! DAG (Directed Acyclic Graph) management for BlockDAG consensus
//!
//! This module provides:
//! - Ancestry queries over the parent relation and over the selected chain
//! - Tip maintenance and an index of the virtual's selected chain

pub mod reachability;
pub mod relations;

pub use reachability::{calc_height, is_chain_ancestor_of, is_dag_ancestor_of};
pub use relations::{update_tips, SelectedChainIndex};
