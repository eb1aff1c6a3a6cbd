use serde::{Deserialize, Serialize};

use crate::header::Header;
use crate::Hash;

/// One header chain per block level, each ordered oldest first and ending at
/// (or right below) the pruning point
pub type PruningPointProof = Vec<Vec<Header>>;

/// Persisted pruning state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruningPointInfo {
    pub pruning_point: Hash,
    pub blue_score: u64,
    /// Set once every block in the pruning point's past had its data deleted
    pub history_pruned_up_to: Hash,
}

impl PruningPointInfo {
    pub fn genesis(genesis: Hash) -> Self {
        Self { pruning_point: genesis, blue_score: 0, history_pruned_up_to: genesis }
    }
}
