//! Staging overlay over the committed stores
//!
//! Every write is recorded twice: as a serialized put in the pending
//! [`WriteBatch`] and as a typed entry in an in-memory overlay, so that later
//! steps of the same operation read their own writes. Nothing becomes visible
//! to other readers before [`StagingArea::commit`].

use consensus_core::acceptance_data::AcceptanceData;
use consensus_core::block::BlockBody;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::ConsensusResult;
use consensus_core::ghostdag::GhostdagData;
use consensus_core::header::Header;
use consensus_core::utxo::UtxoDiff;
use consensus_core::{BlockHashMap, BlockHashSet, Hash};
use database::WriteBatch;
use serde::Serialize;
use std::sync::Arc;

use super::{ConsensusReader, ConsensusStorage};

pub struct StagingArea<'a> {
    storage: &'a ConsensusStorage,
    batch: WriteBatch,
    headers: BlockHashMap<Arc<Header>>,
    ghostdag: BlockHashMap<Arc<GhostdagData>>,
    heights: BlockHashMap<u64>,
    statuses: BlockHashMap<BlockStatus>,
    bodies: BlockHashMap<Arc<BlockBody>>,
    utxo_diffs: BlockHashMap<Arc<UtxoDiff>>,
    acceptance_data: BlockHashMap<Arc<AcceptanceData>>,
    /// Blocks whose body, diff and acceptance data are staged for deletion
    discarded: BlockHashSet,
}

impl<'a> StagingArea<'a> {
    pub fn new(storage: &'a ConsensusStorage) -> Self {
        Self {
            storage,
            batch: WriteBatch::new(),
            headers: Default::default(),
            ghostdag: Default::default(),
            heights: Default::default(),
            statuses: Default::default(),
            bodies: Default::default(),
            utxo_diffs: Default::default(),
            acceptance_data: Default::default(),
            discarded: Default::default(),
        }
    }

    pub fn storage(&self) -> &'a ConsensusStorage {
        self.storage
    }

    pub fn stage_header(&mut self, header: Arc<Header>) -> ConsensusResult<()> {
        self.storage.headers.stage_insert(&mut self.batch, &header)?;
        self.headers.insert(header.hash, header);
        Ok(())
    }

    pub fn stage_ghostdag_data(&mut self, hash: Hash, data: Arc<GhostdagData>) -> ConsensusResult<()> {
        self.storage.ghostdag.stage_insert(&mut self.batch, &hash, &data)?;
        self.ghostdag.insert(hash, data);
        Ok(())
    }

    pub fn stage_height(&mut self, hash: Hash, height: u64) -> ConsensusResult<()> {
        self.storage.reachability.stage_insert(&mut self.batch, &hash, height)?;
        self.heights.insert(hash, height);
        Ok(())
    }

    pub fn stage_status(&mut self, hash: Hash, status: BlockStatus) -> ConsensusResult<()> {
        self.storage.statuses.stage_set(&mut self.batch, &hash, status)?;
        self.statuses.insert(hash, status);
        Ok(())
    }

    pub fn stage_body(&mut self, hash: Hash, body: Arc<BlockBody>) -> ConsensusResult<()> {
        self.storage.bodies.stage_insert(&mut self.batch, &hash, &body)?;
        self.bodies.insert(hash, body);
        Ok(())
    }

    pub fn stage_utxo_diff(&mut self, hash: Hash, diff: Arc<UtxoDiff>) -> ConsensusResult<()> {
        self.storage.utxo_diffs.stage_insert(&mut self.batch, &hash, &diff)?;
        self.utxo_diffs.insert(hash, diff);
        Ok(())
    }

    pub fn stage_acceptance_data(&mut self, hash: Hash, data: Arc<AcceptanceData>) -> ConsensusResult<()> {
        self.storage.acceptance_data.stage_insert(&mut self.batch, &hash, &data)?;
        self.acceptance_data.insert(hash, data);
        Ok(())
    }

    /// Deletes the body, UTXO diff and acceptance data of a block falling below the pruning point
    pub fn stage_block_data_deletion(&mut self, hash: Hash) {
        self.storage.bodies.stage_delete(&mut self.batch, &hash);
        self.storage.utxo_diffs.stage_delete(&mut self.batch, &hash);
        self.storage.acceptance_data.stage_delete(&mut self.batch, &hash);
        self.bodies.remove(&hash);
        self.utxo_diffs.remove(&hash);
        self.acceptance_data.remove(&hash);
        self.discarded.insert(hash);
    }

    /// Applies a diff to the materialized virtual UTXO set
    pub fn stage_virtual_utxo_diff(&mut self, diff: &UtxoDiff) -> ConsensusResult<()> {
        Ok(self.storage.utxo_set.stage_apply_diff(&mut self.batch, diff)?)
    }

    pub fn stage_metadata<T: Serialize>(&mut self, key: &str, value: &T) -> ConsensusResult<()> {
        Ok(self.storage.metadata.stage_put(&mut self.batch, key, value)?)
    }

    /// Number of staged database operations
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Writes everything staged in one atomic batch
    pub fn commit(self) -> ConsensusResult<()> {
        self.storage.commit(self.batch)
    }
}

impl ConsensusReader for StagingArea<'_> {
    fn get_header(&self, hash: &Hash) -> ConsensusResult<Option<Arc<Header>>> {
        match self.headers.get(hash) {
            Some(header) => Ok(Some(header.clone())),
            None => self.storage.get_header(hash),
        }
    }

    fn get_ghostdag_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<GhostdagData>>> {
        match self.ghostdag.get(hash) {
            Some(data) => Ok(Some(data.clone())),
            None => self.storage.get_ghostdag_data(hash),
        }
    }

    fn get_height(&self, hash: &Hash) -> ConsensusResult<Option<u64>> {
        match self.heights.get(hash) {
            Some(height) => Ok(Some(*height)),
            None => self.storage.get_height(hash),
        }
    }

    fn get_status(&self, hash: &Hash) -> ConsensusResult<BlockStatus> {
        match self.statuses.get(hash) {
            Some(status) => Ok(*status),
            None => self.storage.get_status(hash),
        }
    }

    fn get_body(&self, hash: &Hash) -> ConsensusResult<Option<Arc<BlockBody>>> {
        if let Some(body) = self.bodies.get(hash) {
            return Ok(Some(body.clone()));
        }
        if self.discarded.contains(hash) {
            return Ok(None);
        }
        self.storage.get_body(hash)
    }

    fn get_utxo_diff(&self, hash: &Hash) -> ConsensusResult<Option<Arc<UtxoDiff>>> {
        if let Some(diff) = self.utxo_diffs.get(hash) {
            return Ok(Some(diff.clone()));
        }
        if self.discarded.contains(hash) {
            return Ok(None);
        }
        self.storage.get_utxo_diff(hash)
    }

    fn get_acceptance_data(&self, hash: &Hash) -> ConsensusResult<Option<Arc<AcceptanceData>>> {
        if let Some(data) = self.acceptance_data.get(hash) {
            return Ok(Some(data.clone()));
        }
        if self.discarded.contains(hash) {
            return Ok(None);
        }
        self.storage.get_acceptance_data(hash)
    }
}
