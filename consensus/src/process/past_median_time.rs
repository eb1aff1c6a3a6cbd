//! Past median time calculation
//!
//! The past median time of a block is the median timestamp over a window of
//! its selected-parent chain, starting at the selected parent. A new block's
//! timestamp must be strictly greater than it.

use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, ZERO_HASH};

use crate::consensus::storage::ConsensusReader;

/// Past median time calculator
pub struct PastMedianTimeManager {
    /// Number of selected-chain timestamps considered, `2 * tolerance - 1`
    window_size: usize,
}

impl PastMedianTimeManager {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Median timestamp of the window ending at `selected_parent`
    pub fn calc_past_median_time<R: ConsensusReader + ?Sized>(&self, reader: &R, selected_parent: Hash) -> ConsensusResult<u64> {
        let mut timestamps = Vec::with_capacity(self.window_size);
        let mut current = selected_parent;
        while current != ZERO_HASH && timestamps.len() < self.window_size {
            timestamps.push(reader.header(&current)?.timestamp);
            current = reader.ghostdag_data(&current)?.selected_parent;
        }
        Ok(Self::median(timestamps))
    }

    fn median(mut timestamps: Vec<u64>) -> u64 {
        if timestamps.is_empty() {
            return 0;
        }
        timestamps.sort_unstable();
        timestamps[timestamps.len() / 2]
    }
}
