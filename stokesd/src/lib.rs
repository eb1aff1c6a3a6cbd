//! Stokesd - Stokes blockDAG consensus node daemon
//!
//! Wires the consensus engine to a RocksDB store, feeds it through the block
//! process queue and reports its sync status until shut down.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod ui;

pub use cli::Args;
pub use config::Config;
pub use daemon::Daemon;
