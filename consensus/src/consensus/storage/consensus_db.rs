//! Consensus database interface
//!
//! Bundles the typed stores of the `database` crate over one shared handle.

use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::block::BlockBody;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::ConsensusResult;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::utxo::UtxoDiff;
use consensus_core::Hash;
use database::stores::{
    AcceptanceDataStore, BlockStore, GhostdagStore, HeaderStore, MetadataStore, ReachabilityStore, StatusStore,
    UtxoDiffStore, UtxoStore,
};
use database::{Database, WriteBatch};
use std::sync::Arc;

use super::ConsensusReader;

const HEADER_CACHE_SIZE: usize = 10_000;
const GHOSTDAG_CACHE_SIZE: usize = 10_000;
const HEIGHT_CACHE_SIZE: usize = 10_000;
const BODY_CACHE_SIZE: usize = 500;
const DIFF_CACHE_SIZE: usize = 1_000;
const ACCEPTANCE_CACHE_SIZE: usize = 1_000;

/// Consensus storage coordinator
pub struct ConsensusStorage {
    db: Arc<Database>,
    pub headers: HeaderStore,
    pub bodies: BlockStore,
    pub ghostdag: GhostdagStore,
    pub reachability: ReachabilityStore,
    pub statuses: StatusStore,
    pub utxo_diffs: UtxoDiffStore,
    pub acceptance_data: AcceptanceDataStore,
    pub utxo_set: UtxoStore,
    pub metadata: MetadataStore,
}

impl ConsensusStorage {
    /// Create the stores over an opened database
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            headers: HeaderStore::new(db.clone(), HEADER_CACHE_SIZE),
            bodies: BlockStore::new(db.clone(), BODY_CACHE_SIZE),
            ghostdag: GhostdagStore::new(db.clone(), GHOSTDAG_CACHE_SIZE),
            reachability: ReachabilityStore::new(db.clone(), HEIGHT_CACHE_SIZE),
            statuses: StatusStore::new(db.clone()),
            utxo_diffs: UtxoDiffStore::new(db.clone(), DIFF_CACHE_SIZE),
            acceptance_data: AcceptanceDataStore::new(db.clone(), ACCEPTANCE_CACHE_SIZE),
            utxo_set: UtxoStore::new(db.clone()),
            metadata: MetadataStore::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Atomically applies a staged batch
    pub fn commit(&self, batch: WriteBatch) -> ConsensusResult<()> {
        Ok(self.db.write_batch(batch)?)
    }
}

impl ConsensusReader for ConsensusStorage {
    fn get_header(&self, hash: &Hash) -> ConsensusResult<Option<Arc<Header>>> {
        Ok(self.headers.get(hash)?)
    }

    fn get_ghostdag_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<GhostdagData>>> {
        Ok(self.ghostdag.get(hash)?)
    }

    fn get_height(&self, hash: &Hash) -> ConsensusResult<Option<u64>> {
        Ok(self.reachability.get_height(hash)?)
    }

    fn get_status(&self, hash: &Hash) -> ConsensusResult<BlockStatus> {
        Ok(self.statuses.get(hash)?)
    }

    fn get_body(&self, hash: &Hash) -> ConsensusResult<Option<Arc<BlockBody>>> {
        Ok(self.bodies.get(hash)?)
    }

    fn get_utxo_diff(&self, hash: &Hash) -> ConsensusResult<Option<Arc<UtxoDiff>>> {
        Ok(self.utxo_diffs.get(hash)?)
    }

    fn get_acceptance_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<AcceptanceData>>> {
        Ok(self.acceptance_data.get(hash)?)
    }
}
