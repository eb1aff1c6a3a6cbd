/// Sompi is the smallest unit of a stokes coin
pub const SOMPI_PER_STOKES: u64 = 100_000_000;

/// Upper bound on any amount, equal to the total emission of the mainnet schedule
pub const MAX_SOMPI: u64 = 12_623_040_000 * SOMPI_PER_STOKES;

/// DAA score assigned to entries whose accepting block is not yet known
pub const UNACCEPTED_DAA_SCORE: u64 = u64::MAX;

pub const BLOCK_VERSION: u16 = 1;
pub const TX_VERSION: u16 = 0;

/// Highest level a block can reach in the multi-level DAG
pub const MAX_BLOCK_LEVEL: u8 = 225;

pub mod perf {
    /// Number of headers handled per section in pruning-proof generation and verification
    pub const PROOF_BATCH_SIZE: usize = 256;

    /// Default number of blocks pruned per section
    pub const PRUNING_BATCH_SIZE: usize = 512;

    /// Default bound of the block process queue
    pub const PROCESS_QUEUE_CAPACITY: usize = 1024;
}
