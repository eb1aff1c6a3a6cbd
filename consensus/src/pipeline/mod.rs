//! Block processing pipeline for consensus
//!
//! The contextual half of block processing and the virtual resolution it
//! triggers, plus the queue that serializes submissions into them.

pub mod block_processor;
pub mod virtual_processor;
pub mod virtual_state;

pub mod flow;

pub use block_processor::{BlockProcessor, StagedBlock};
pub use virtual_processor::{ChainPath, VirtualProcessor, VirtualUpdate};
pub use virtual_state::VirtualState;
