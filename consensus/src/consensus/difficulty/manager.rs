//! Difficulty manager for consensus
//!
//! The expected difficulty of a block is derived from the average target of
//! its window, scaled by how far the window's timespan deviates from the
//! expected one. The scaling factor is clamped to `[1/4, 4]`.

use consensus_core::errors::ConsensusResult;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::pow::{compact_to_target, target_to_compact};
use consensus_core::Hash;
use primitive_types::{U256, U512};

use super::window::DifficultyWindow;
use crate::consensus::storage::ConsensusReader;

/// Difficulty manager for consensus
pub struct DifficultyManager {
    genesis_bits: u32,
    max_difficulty_bits: u32,
    target_time_per_block: u64,
    window_size: usize,
}

impl DifficultyManager {
    pub fn new(genesis_bits: u32, max_difficulty_bits: u32, target_time_per_block: u64, window_size: usize) -> Self {
        Self { genesis_bits, max_difficulty_bits, target_time_per_block, window_size }
    }

    /// DAA score of a block: its selected parent's score plus the size of its mergeset,
    /// the selected parent included
    pub fn calc_daa_score<R: ConsensusReader + ?Sized>(&self, reader: &R, ghostdag_data: &GhostdagData) -> ConsensusResult<u64> {
        let selected_parent_score = reader.header(&ghostdag_data.selected_parent)?.daa_score;
        Ok(selected_parent_score + ghostdag_data.mergeset_size() as u64)
    }

    /// Expected `bits` of a block whose selected parent is `selected_parent`
    pub fn calculate_difficulty_bits<R: ConsensusReader + ?Sized>(&self, reader: &R, selected_parent: Hash) -> ConsensusResult<u32> {
        let window = DifficultyWindow::from_selected_chain(reader, selected_parent, self.window_size)?;
        Ok(self.calculate_from_window(&window))
    }

    /// Young DAGs whose chain cannot fill the window stay at the genesis difficulty
    pub fn calculate_from_window(&self, window: &DifficultyWindow) -> u32 {
        if !window.is_full() || window.len() < 2 {
            return self.genesis_bits;
        }

        let expected_span = self.target_time_per_block * (window.len() as u64 - 1);
        let actual_span = window.time_span().clamp(expected_span / 4, expected_span * 4).max(1);

        let average_target = window.average_target(compact_to_target);
        let new_target = average_target * U512::from(actual_span) / U512::from(expected_span);

        let max_target = compact_to_target(self.max_difficulty_bits);
        let new_target = match U256::try_from(new_target) {
            Ok(target) if target <= max_target => target,
            _ => max_target,
        };
        target_to_compact(new_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::TestDag;

    const BITS: u32 = 0x1e7fffff;
    const EASIEST: u32 = 0x207fffff;

    /// A chain of `len` blocks spaced `spacing` ms apart, returning its tip
    fn spaced_chain(dag: &mut TestDag, len: u64, spacing: u64, bits: u32) -> Hash {
        let mut tip = dag.genesis;
        let start = dag.storage.header(&tip).unwrap().timestamp;
        for i in 1..=len {
            tip = dag.add_with(&[tip], start + i * spacing, bits);
        }
        tip
    }

    #[test]
    fn test_young_dag_uses_genesis_bits() {
        let mut dag = TestDag::new(3, 10);
        let tip = spaced_chain(&mut dag, 3, 1000, BITS);
        let manager = DifficultyManager::new(EASIEST, EASIEST, 1000, 10);
        assert_eq!(manager.calculate_difficulty_bits(&dag.storage, tip).unwrap(), EASIEST);
    }

    #[test]
    fn test_on_target_keeps_difficulty() {
        let mut dag = TestDag::new(3, 10);
        let tip = spaced_chain(&mut dag, 12, 1000, BITS);
        let manager = DifficultyManager::new(EASIEST, EASIEST, 1000, 10);
        assert_eq!(manager.calculate_difficulty_bits(&dag.storage, tip).unwrap(), BITS);
    }

    #[test]
    fn test_fast_blocks_raise_difficulty_with_clamp() {
        let mut dag = TestDag::new(3, 10);
        let tip = spaced_chain(&mut dag, 12, 1, BITS);
        let manager = DifficultyManager::new(EASIEST, EASIEST, 1000, 10);
        let bits = manager.calculate_difficulty_bits(&dag.storage, tip).unwrap();
        // Clamped at a quarter of the previous target
        assert_eq!(compact_to_target(bits), compact_to_target(BITS) / 4);
    }

    #[test]
    fn test_slow_blocks_capped_at_max_target() {
        let mut dag = TestDag::new(3, 10);
        let tip = spaced_chain(&mut dag, 12, 100_000, EASIEST);
        let manager = DifficultyManager::new(EASIEST, EASIEST, 1000, 10);
        assert_eq!(manager.calculate_difficulty_bits(&dag.storage, tip).unwrap(), EASIEST);
    }

    #[test]
    fn test_daa_score_counts_mergeset() {
        let mut dag = TestDag::new(3, 10);
        let genesis = dag.genesis;
        let a = dag.add(&[genesis]);
        let b = dag.add(&[genesis]);
        let data = dag.ghostdag.ghostdag(&dag.storage, &[a, b], None).unwrap();
        let manager = DifficultyManager::new(EASIEST, EASIEST, 1000, 10);
        // Headers of the test fixture carry a zero DAA score
        assert_eq!(manager.calc_daa_score(&dag.storage, &data).unwrap(), 2);
    }
}
