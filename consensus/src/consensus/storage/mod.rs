//! Storage module for consensus
//!
//! Persistent stores are bundled by [`ConsensusStorage`]. Block processing never
//! writes to them directly: all changes of one operation go through a
//! [`StagingArea`] and are committed as a single atomic batch.

pub mod consensus_db;
pub mod staging;
pub mod utxo_set;

use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::block::BlockBody;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use std::sync::Arc;

pub use consensus_db::ConsensusStorage;
pub use staging::StagingArea;
pub use utxo_set::UtxoStateCursor;

/// Read access to per-block consensus data, either committed or staged.
/// All ordering and validation algorithms are written against this trait.
pub trait ConsensusReader {
    fn get_header(&self, hash: &Hash) -> ConsensusResult<Option<Arc<Header>>>;

    fn get_ghostdag_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<GhostdagData>>>;

    fn get_height(&self, hash: &Hash) -> ConsensusResult<Option<u64>>;

    /// [`BlockStatus::Unknown`] for blocks never stored
    fn get_status(&self, hash: &Hash) -> ConsensusResult<BlockStatus>;

    fn get_body(&self, hash: &Hash) -> ConsensusResult<Option<Arc<BlockBody>>>;

    fn get_utxo_diff(&self, hash: &Hash) -> ConsensusResult<Option<Arc<UtxoDiff>>>;

    fn get_acceptance_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<AcceptanceData>>>;

    /// Header of a block that must be known
    fn header(&self, hash: &Hash) -> ConsensusResult<Arc<Header>> {
        self.get_header(hash)?.ok_or_else(|| missing("header", hash))
    }

    /// GHOSTDAG data of a block that must be known
    fn ghostdag_data(&self, hash: &Hash) -> ConsensusResult<Arc<GhostdagData>> {
        self.get_ghostdag_data(hash)?.ok_or_else(|| missing("ghostdag data", hash))
    }

    fn height(&self, hash: &Hash) -> ConsensusResult<u64> {
        self.get_height(hash)?.ok_or_else(|| missing("height", hash))
    }

    fn body(&self, hash: &Hash) -> ConsensusResult<Arc<BlockBody>> {
        self.get_body(hash)?.ok_or_else(|| missing("block body", hash))
    }
}

pub(crate) fn missing(what: &str, hash: &Hash) -> ConsensusError {
    ConsensusError::internal(format!("missing {what} for block {hash}"))
}
