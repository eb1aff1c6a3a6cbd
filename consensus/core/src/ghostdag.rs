use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{BlockHashMap, BlueWorkType, KType};
use crate::{Hash, ZERO_HASH};

/// Per-block GHOSTDAG ordering data. Computed once when the block is added and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostdagData {
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub selected_parent: Hash,
    /// The selected parent first, then the remaining blues in ascending order
    pub mergeset_blues: Vec<Hash>,
    /// Ascending order
    pub mergeset_reds: Vec<Hash>,
    /// Anticone size of each blue block (in this block's mergeset and its selected chain) within this block's context
    pub blues_anticone_sizes: BlockHashMap<KType>,
}

impl GhostdagData {
    pub fn new_with_selected_parent(selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues = Vec::with_capacity(k as usize + 1);
        let mut blues_anticone_sizes = BlockHashMap::with_capacity(k as usize);
        mergeset_blues.push(selected_parent);
        blues_anticone_sizes.insert(selected_parent, 0);
        Self {
            blue_score: Default::default(),
            blue_work: Default::default(),
            selected_parent,
            mergeset_blues,
            mergeset_reds: Vec::new(),
            blues_anticone_sizes,
        }
    }

    /// Data of the genesis block, whose selected parent is the zero hash
    pub fn genesis(blue_work: BlueWorkType) -> Self {
        Self {
            blue_score: 0,
            blue_work,
            selected_parent: ZERO_HASH,
            mergeset_blues: Vec::new(),
            mergeset_reds: Vec::new(),
            blues_anticone_sizes: BlockHashMap::new(),
        }
    }

    pub fn add_blue(&mut self, block: Hash, blue_anticone_size: KType, block_blues_anticone_sizes: &BlockHashMap<KType>) {
        self.mergeset_blues.push(block);
        self.blues_anticone_sizes.insert(block, blue_anticone_size);
        // The new blue is in the anticone of each of these blues
        for (blue, size) in block_blues_anticone_sizes {
            self.blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn add_red(&mut self, block: Hash) {
        self.mergeset_reds.push(block);
    }

    pub fn finalize_score_and_work(&mut self, blue_score: u64, blue_work: BlueWorkType) {
        self.blue_score = blue_score;
        self.blue_work = blue_work;
    }

    pub fn mergeset_size(&self) -> usize {
        self.mergeset_blues.len() + self.mergeset_reds.len()
    }

    /// Mergeset including the selected parent, in no particular order
    pub fn unordered_mergeset(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().chain(self.mergeset_reds.iter()).copied()
    }

    /// Mergeset blocks other than the selected parent: blues ascending, then reds ascending
    pub fn consensus_ordered_mergeset_without_selected_parent(&self) -> impl Iterator<Item = Hash> + '_ {
        self.mergeset_blues.iter().skip(1).chain(self.mergeset_reds.iter()).copied()
    }

    pub fn is_blue(&self, hash: &Hash) -> bool {
        self.mergeset_blues.contains(hash)
    }

    pub fn to_compact(&self) -> CompactGhostdagData {
        CompactGhostdagData { blue_score: self.blue_score, blue_work: self.blue_work, selected_parent: self.selected_parent }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactGhostdagData {
    pub blue_score: u64,
    pub blue_work: BlueWorkType,
    pub selected_parent: Hash,
}

/// Block ordered by blue work, ties broken by the byte-wise order of the hash
#[derive(Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_work: BlueWorkType,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_work: BlueWorkType) -> Self {
        Self { hash, blue_work }
    }
}

impl PartialEq for SortableBlock {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_work.cmp(&other.blue_work).then_with(|| self.hash.cmp(&other.hash))
    }
}
