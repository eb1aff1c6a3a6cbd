use crate::errors::ConsensusResult;
use crate::tx::{TransactionOutpoint, UtxoEntry};
use crate::utxo::UtxoDiff;

/// Read access to a UTXO set, which may live in memory or in the store
pub trait UtxoView {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>>;
}

impl<V: UtxoView + ?Sized> UtxoView for &V {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        (**self).get(outpoint)
    }
}

/// A base view with a diff applied on top
pub struct ComposedUtxoView<'a, V: UtxoView> {
    base: V,
    diff: &'a UtxoDiff,
}

impl<'a, V: UtxoView> ComposedUtxoView<'a, V> {
    pub fn new(base: V, diff: &'a UtxoDiff) -> Self {
        Self { base, diff }
    }
}

impl<V: UtxoView> UtxoView for ComposedUtxoView<'_, V> {
    fn get(&self, outpoint: &TransactionOutpoint) -> ConsensusResult<Option<UtxoEntry>> {
        if let Some(entry) = self.diff.add.get(outpoint) {
            return Ok(Some(entry.clone()));
        }
        if self.diff.remove.contains(outpoint) {
            return Ok(None);
        }
        self.base.get(outpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::ScriptPublicKey;
    use crate::utxo::UtxoCollection;
    use crate::Hash;

    #[test]
    fn test_diff_overrides_base() {
        let op_a = TransactionOutpoint::new(Hash::from_u64_word(1), 0);
        let op_b = TransactionOutpoint::new(Hash::from_u64_word(2), 0);
        let op_c = TransactionOutpoint::new(Hash::from_u64_word(3), 0);
        let entry = UtxoEntry::new(1, ScriptPublicKey::default(), 0, false);
        let base: UtxoCollection = [(op_a, entry.clone()), (op_b, entry.clone())].into_iter().collect();
        let mut diff = UtxoDiff::default();
        diff.remove.insert(op_a, entry.clone());
        diff.add.insert(op_c, entry.clone());

        let view = ComposedUtxoView::new(&base, &diff);
        assert_eq!(view.get(&op_a).unwrap(), None);
        assert_eq!(view.get(&op_b).unwrap(), Some(entry.clone()));
        assert_eq!(view.get(&op_c).unwrap(), Some(entry));
    }
}
