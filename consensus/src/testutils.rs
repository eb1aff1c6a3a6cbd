//! Header-only DAG fixtures for unit tests of the ordering algorithms

use consensus_core::blockstatus::BlockStatus;
use consensus_core::config::genesis::SIMNET_GENESIS;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::{Hash, KType, ZERO_HASH};
use database::Database;
use std::sync::Arc;

use crate::consensus::dag::calc_height;
use crate::consensus::ghostdag::GhostdagManager;
use crate::consensus::storage::{ConsensusReader, ConsensusStorage, StagingArea};

pub const TEST_BITS: u32 = 0x207fffff;

/// Commits blocks one by one with GHOSTDAG data and heights computed from their parents
pub struct TestDag {
    pub storage: ConsensusStorage,
    pub ghostdag: GhostdagManager,
    pub genesis: Hash,
    next_id: u64,
}

impl TestDag {
    pub fn new(k: KType, mergeset_size_limit: u64) -> Self {
        let storage = ConsensusStorage::new(Database::in_memory());
        let genesis_header = Arc::new(SIMNET_GENESIS.header());
        let genesis = genesis_header.hash;
        let ghostdag = GhostdagManager::new(genesis, k, mergeset_size_limit, 1_000);
        let mut staging = StagingArea::new(&storage);
        staging.stage_header(genesis_header).unwrap();
        staging.stage_height(genesis, 0).unwrap();
        staging.stage_ghostdag_data(genesis, Arc::new(ghostdag.genesis_ghostdag_data(TEST_BITS))).unwrap();
        staging.stage_status(genesis, BlockStatus::Active).unwrap();
        staging.commit().unwrap();
        Self { storage, ghostdag, genesis, next_id: 1 }
    }

    pub fn add(&mut self, parents: &[Hash]) -> Hash {
        let timestamp = SIMNET_GENESIS.timestamp + self.next_id * 1000;
        self.add_with(parents, timestamp, TEST_BITS)
    }

    pub fn add_with(&mut self, parents: &[Hash], timestamp: u64, bits: u32) -> Hash {
        let data = self.ghostdag.ghostdag(&self.storage, parents, Some(bits)).unwrap();
        let header = Header::new_finalized(
            1,
            vec![parents.to_vec()],
            Hash::from_u64_word(self.next_id),
            ZERO_HASH,
            ZERO_HASH,
            timestamp,
            bits,
            0,
            0,
            data.blue_work,
            data.blue_score,
            self.genesis,
        );
        self.next_id += 1;
        self.commit(header, data)
    }

    fn commit(&self, header: Header, data: GhostdagData) -> Hash {
        let hash = header.hash;
        let height = calc_height(&self.storage, header.direct_parents()).unwrap();
        let mut staging = StagingArea::new(&self.storage);
        staging.stage_header(Arc::new(header)).unwrap();
        staging.stage_height(hash, height).unwrap();
        staging.stage_ghostdag_data(hash, Arc::new(data)).unwrap();
        staging.stage_status(hash, BlockStatus::Active).unwrap();
        staging.commit().unwrap();
        hash
    }

    /// A selected chain of `len` blocks on top of `from`, returning the chain tip
    pub fn chain(&mut self, from: Hash, len: usize) -> Hash {
        let mut tip = from;
        for _ in 0..len {
            tip = self.add(&[tip]);
        }
        tip
    }

    pub fn data(&self, hash: &Hash) -> Arc<GhostdagData> {
        self.storage.ghostdag_data(hash).unwrap()
    }
}
