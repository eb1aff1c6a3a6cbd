//! GHOSTDAG consensus implementation
//!
//! This module implements the GHOSTDAG protocol for BlockDAG consensus,
//! including selected parent choice, mergeset construction, the k-cluster
//! blue/red coloring and blue score/work accounting.

pub mod manager;
pub mod protocol;

pub use manager::GhostdagManager;
pub use protocol::{ColoringOutput, GhostdagProtocol};
