//! Consensus data model shared by the engine, the storage layer and the daemon.

use std::collections::{HashMap, HashSet};

pub mod acceptance_data;
pub mod api;
pub mod block;
pub mod blockstatus;
pub mod coinbase;
pub mod config;
pub mod errors;
pub mod ghostdag;
pub mod hashing;
pub mod header;
pub mod mass;
pub mod merkle;
pub mod muhash;
pub mod network;
pub mod pow;
pub mod pruning;
pub mod subnets;
pub mod time;
pub mod tx;
pub mod utxo;

pub use stokes_hashes::{Hash, HASH_SIZE, ZERO_HASH};

/// Accumulated blue work
pub type BlueWorkType = stokes_math::Uint192;

/// The type used to represent the GHOSTDAG K parameter and anticone sizes
pub type KType = u16;

pub type BlockHashMap<V> = HashMap<Hash, V>;
pub type BlockHashSet = HashSet<Hash>;
