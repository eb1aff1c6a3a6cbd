//! Processing flow for block pipeline

pub mod process_queue;

pub use process_queue::ProcessQueue;
