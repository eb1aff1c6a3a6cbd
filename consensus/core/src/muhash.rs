use stokes_muhash::MuHash;

use crate::tx::{TransactionOutpoint, UtxoEntry};
use crate::utxo::utxo_diff::UtxoDiff;

pub use stokes_muhash::EMPTY_MUHASH;

pub trait MuHashExtensions {
    fn add_utxo(&mut self, outpoint: &TransactionOutpoint, entry: &UtxoEntry);
    fn remove_utxo(&mut self, outpoint: &TransactionOutpoint, entry: &UtxoEntry);
    fn add_utxo_diff(&mut self, diff: &UtxoDiff);
}

impl MuHashExtensions for MuHash {
    fn add_utxo(&mut self, outpoint: &TransactionOutpoint, entry: &UtxoEntry) {
        self.add_element(&utxo_element_bytes(outpoint, entry));
    }

    fn remove_utxo(&mut self, outpoint: &TransactionOutpoint, entry: &UtxoEntry) {
        self.remove_element(&utxo_element_bytes(outpoint, entry));
    }

    /// Removals are applied before additions, matching how a diff is applied to a set
    fn add_utxo_diff(&mut self, diff: &UtxoDiff) {
        for (outpoint, entry) in diff.remove.iter() {
            self.remove_utxo(outpoint, entry);
        }
        for (outpoint, entry) in diff.add.iter() {
            self.add_utxo(outpoint, entry);
        }
    }
}

fn utxo_element_bytes(outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> Vec<u8> {
    let script = entry.script_public_key.script();
    let mut bytes = Vec::with_capacity(32 + 4 + 8 + 8 + 1 + 2 + 8 + script.len());
    bytes.extend_from_slice(outpoint.transaction_id.as_bytes());
    bytes.extend_from_slice(&outpoint.index.to_le_bytes());
    bytes.extend_from_slice(&entry.amount.to_le_bytes());
    bytes.extend_from_slice(&entry.block_daa_score.to_le_bytes());
    bytes.push(entry.is_coinbase as u8);
    bytes.extend_from_slice(&entry.script_public_key.version.to_le_bytes());
    bytes.extend_from_slice(&(script.len() as u64).to_le_bytes());
    bytes.extend_from_slice(script);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ScriptPublicKey;
    use crate::Hash;

    #[test]
    fn test_diff_application_matches_direct_updates() {
        let op1 = TransactionOutpoint::new(Hash::from_u64_word(1), 0);
        let op2 = TransactionOutpoint::new(Hash::from_u64_word(2), 1);
        let e1 = UtxoEntry::new(10, ScriptPublicKey::default(), 3, false);
        let e2 = UtxoEntry::new(20, ScriptPublicKey::default(), 4, true);

        let mut base = MuHash::new();
        base.add_utxo(&op1, &e1);

        let mut diff = UtxoDiff::default();
        diff.remove.insert(op1, e1.clone());
        diff.add.insert(op2, e2.clone());

        let mut via_diff = base;
        via_diff.add_utxo_diff(&diff);

        let mut direct = MuHash::new();
        direct.add_utxo(&op2, &e2);
        assert_eq!(via_diff.finalize(), direct.finalize());

        via_diff.add_utxo_diff(&diff.reversed());
        assert_eq!(via_diff.finalize(), base.finalize());
    }
}
