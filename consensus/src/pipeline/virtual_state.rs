//! The persisted state of the virtual block

use consensus_core::ghostdag::GhostdagData;
use consensus_core::pruning::PruningPointInfo;
use consensus_core::Hash;
use serde::{Deserialize, Serialize};
use stokes_muhash::MuHash;

/// Everything known about the virtual block. Stored as a single metadata record and replaced
/// atomically with the block data that changed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualState {
    pub parents: Vec<Hash>,
    pub ghostdag_data: GhostdagData,
    pub daa_score: u64,
    /// Difficulty a block merging exactly the virtual parents would carry
    pub bits: u32,
    pub past_median_time: u64,
    /// Commitment to the UTXO set of the sink
    pub multiset: MuHash,
    pub tips: Vec<Hash>,
    pub pruning_point: PruningPointInfo,
    pub header_count: u64,
    pub block_count: u64,
}

impl VirtualState {
    /// The selected parent of the virtual
    pub fn sink(&self) -> Hash {
        self.ghostdag_data.selected_parent
    }
}
