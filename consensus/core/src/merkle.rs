use stokes_hashes::calc_merkle_root;

use crate::tx::{Transaction, TransactionId};
use crate::Hash;

/// Merkle root over the ids of a block's transactions, in block order
pub fn calc_hash_merkle_root<'a>(txs: impl ExactSizeIterator<Item = &'a Transaction>) -> Hash {
    calc_merkle_root(txs.map(|tx| tx.id()))
}

/// Merkle root over the ids of the transactions accepted by a chain block, in acceptance order
pub fn calc_accepted_id_merkle_root(accepted_ids: &[TransactionId]) -> Hash {
    calc_merkle_root(accepted_ids.iter().copied())
}
