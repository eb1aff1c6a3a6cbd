use serde::{Deserialize, Serialize};

/// Per-block status relative to the virtual. `Unknown` is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatus {
    /// The block is not known to this node
    Unknown,
    /// Failed a header-level or chain-level rule and is rejected permanently
    Invalid,
    /// Validated and ordered but never connected to the selected chain
    Pending,
    /// On the virtual's selected chain with its UTXO diff applied
    Active,
    /// Was active and got disconnected by a better chain. Its diff is kept for reconnection
    Superseded,
    /// Its UTXO diff failed to validate. Mergeable but never selected again
    DisqualifiedFromChain,
    /// Below the pruning point. Body, diff and acceptance data were discarded
    Pruned,
}

impl BlockStatus {
    pub fn is_known(self) -> bool {
        !matches!(self, BlockStatus::Unknown)
    }

    pub fn is_invalid(self) -> bool {
        matches!(self, BlockStatus::Invalid)
    }

    pub fn has_block_body(self) -> bool {
        matches!(self, BlockStatus::Pending | BlockStatus::Active | BlockStatus::Superseded | BlockStatus::DisqualifiedFromChain)
    }

    /// Whether the block may still become part of the selected chain
    pub fn is_chain_eligible(self) -> bool {
        matches!(self, BlockStatus::Pending | BlockStatus::Active | BlockStatus::Superseded)
    }

    /// Whether a diff was computed for the block and is still stored
    pub fn has_utxo_diff(self) -> bool {
        matches!(self, BlockStatus::Active | BlockStatus::Superseded)
    }
}

impl std::fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
