pub mod constants;
pub mod genesis;
pub mod params;

use std::ops::Deref;

use constants::perf;
use params::Params;

/// Engine configuration: the consensus parameters plus local, non-consensus settings
#[derive(Clone, Debug)]
pub struct Config {
    pub params: Params,
    /// Bound of the block process queue
    pub process_queue_capacity: usize,
    /// Archive nodes disable pruning and keep all block data
    pub enable_pruning: bool,
    pub pruning_batch_size: usize,
}

impl Config {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            process_queue_capacity: perf::PROCESS_QUEUE_CAPACITY,
            enable_pruning: true,
            pruning_batch_size: perf::PRUNING_BATCH_SIZE,
        }
    }
}

impl Deref for Config {
    type Target = Params;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}
