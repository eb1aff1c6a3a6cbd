use serde::{Deserialize, Serialize};

use crate::tx::TransactionId;
use crate::Hash;

/// Transactions accepted from one block of a chain block's mergeset (or from the chain block itself)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergesetBlockAcceptanceData {
    pub block_hash: Hash,
    pub accepted_transactions: Vec<TransactionId>,
}

/// Acceptance data of a chain block, in acceptance order
pub type AcceptanceData = Vec<MergesetBlockAcceptanceData>;

pub fn accepted_transaction_ids(data: &AcceptanceData) -> impl Iterator<Item = TransactionId> + '_ {
    data.iter().flat_map(|block| block.accepted_transactions.iter().copied())
}
