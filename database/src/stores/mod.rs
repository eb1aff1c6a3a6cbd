pub mod acceptance_data_store;
pub mod block_store;
pub mod ghostdag_store;
pub mod header_store;
pub mod metadata_store;
pub mod reachability_store;
pub mod status_store;
pub mod utxo_diff_store;
pub mod utxo_store;

pub use acceptance_data_store::AcceptanceDataStore;
pub use block_store::BlockStore;
pub use ghostdag_store::GhostdagStore;
pub use header_store::HeaderStore;
pub use metadata_store::MetadataStore;
pub use reachability_store::ReachabilityStore;
pub use status_store::StatusStore;
pub use utxo_diff_store::UtxoDiffStore;
pub use utxo_store::UtxoStore;
