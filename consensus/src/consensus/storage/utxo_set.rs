//! UTXO state tracking while walking the selected chain
//!
//! The materialized UTXO set on disk always corresponds to the committed sink.
//! A [`UtxoStateCursor`] describes some other chain position as an accumulated
//! diff against that set plus the MuHash of the resulting state.

use consensus_core::muhash::MuHashExtensions;
use consensus_core::utxo::{ComposedUtxoView, UtxoDiff, UtxoView};
use stokes_muhash::MuHash;

#[derive(Clone, Debug)]
pub struct UtxoStateCursor {
    /// Changes relative to the committed virtual UTXO set
    diff: UtxoDiff,
    multiset: MuHash,
}

impl UtxoStateCursor {
    /// A cursor positioned at the committed sink, whose state commitment is `multiset`
    pub fn new(multiset: MuHash) -> Self {
        Self { diff: UtxoDiff::default(), multiset }
    }

    /// Moves the cursor over one chain block (or back, for a reversed diff)
    pub fn apply(&mut self, diff: &UtxoDiff) {
        self.diff.with_diff_in_place(diff);
        self.multiset.add_utxo_diff(diff);
    }

    pub fn diff(&self) -> &UtxoDiff {
        &self.diff
    }

    pub fn multiset(&self) -> MuHash {
        self.multiset
    }

    /// The UTXO set at the cursor position, given the committed set as `base`
    pub fn view<V: UtxoView>(&self, base: V) -> ComposedUtxoView<'_, V> {
        ComposedUtxoView::new(base, &self.diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::muhash::EMPTY_MUHASH;
    use consensus_core::tx::{ScriptPublicKey, TransactionOutpoint, UtxoEntry};
    use consensus_core::utxo::UtxoCollection;
    use consensus_core::Hash;

    #[test]
    fn test_cursor_round_trip() {
        let op = TransactionOutpoint::new(Hash::from_u64_word(1), 0);
        let entry = UtxoEntry::new(9, ScriptPublicKey::default(), 2, true);
        let base = UtxoCollection::new();
        let mut block_diff = UtxoDiff::default();
        block_diff.add.insert(op, entry.clone());

        let mut cursor = UtxoStateCursor::new(EMPTY_MUHASH);
        cursor.apply(&block_diff);
        assert_eq!(cursor.view(&base).get(&op).unwrap(), Some(entry));
        assert_ne!(cursor.multiset().finalize(), EMPTY_MUHASH.finalize());

        cursor.apply(&block_diff.reversed());
        assert!(cursor.diff().is_empty());
        assert_eq!(cursor.view(&base).get(&op).unwrap(), None);
        assert_eq!(cursor.multiset().finalize(), EMPTY_MUHASH.finalize());
    }
}
