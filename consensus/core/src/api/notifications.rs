use serde::{Deserialize, Serialize};

use crate::tx::TransactionId;
use crate::Hash;

/// Events published to the mempool and other subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    BlockAdded { hash: Hash, blue_score: u64, daa_score: u64 },
    VirtualChainChanged {
        removed_chain_block_hashes: Vec<Hash>,
        added_chain_block_hashes: Vec<Hash>,
        /// Transactions accepted by the added chain blocks
        accepted_transaction_ids: Vec<TransactionId>,
    },
    VirtualDaaScoreChanged(u64),
    PruningPointAdvanced(Hash),
}

impl Notification {
    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::BlockAdded { .. } => "block-added",
            Notification::VirtualChainChanged { .. } => "virtual-chain-changed",
            Notification::VirtualDaaScoreChanged(_) => "virtual-daa-score-changed",
            Notification::PruningPointAdvanced(_) => "pruning-point-advanced",
        }
    }
}
