//! Difficulty window management
//!
//! The window of a block is the sequence of its selected-chain ancestors
//! starting at its selected parent. Only chain blocks are sampled, so the
//! window is a pure function of the block's past.

use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, ZERO_HASH};
use primitive_types::{U256, U512};

use crate::consensus::storage::ConsensusReader;

/// Timestamp and difficulty samples of a chain window, newest first
#[derive(Clone, Debug, Default)]
pub struct DifficultyWindow {
    window_size: usize,
    samples: Vec<(u64, u32)>,
}

impl DifficultyWindow {
    /// Collects up to `window_size` chain blocks starting at `from` and walking selected parents
    pub fn from_selected_chain<R: ConsensusReader + ?Sized>(reader: &R, from: Hash, window_size: usize) -> ConsensusResult<Self> {
        let mut samples = Vec::with_capacity(window_size);
        let mut current = from;
        while samples.len() < window_size && current != ZERO_HASH {
            let header = reader.header(&current)?;
            samples.push((header.timestamp, header.bits));
            current = reader.ghostdag_data(&current)?.selected_parent;
        }
        Ok(Self { window_size, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the chain was deep enough to fill the window
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.window_size
    }

    /// Difference between the latest and the earliest timestamp in the window
    pub fn time_span(&self) -> u64 {
        let min = self.samples.iter().map(|(timestamp, _)| *timestamp).min().unwrap_or_default();
        let max = self.samples.iter().map(|(timestamp, _)| *timestamp).max().unwrap_or_default();
        max - min
    }

    /// Mean of the window targets, summed in 512 bits so the sum cannot overflow
    pub fn average_target(&self, compact_to_target: impl Fn(u32) -> U256) -> U512 {
        if self.samples.is_empty() {
            return U512::zero();
        }
        let sum = self.samples.iter().fold(U512::zero(), |sum, (_, bits)| sum + U512::from(compact_to_target(*bits)));
        sum / U512::from(self.samples.len() as u64)
    }
}
