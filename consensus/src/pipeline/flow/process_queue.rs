//! Process queue for block processing
//!
//! Blocks from any number of submitters are checked in isolation on the
//! submitting task, then funneled through a bounded channel into one worker
//! thread that owns the serialized processing section. Each submitter awaits
//! the outcome of its own block on a oneshot reply. Pending pruning runs on the
//! same thread one batch at a time, interleaved with queued blocks.

use consensus_core::block::Block;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::errors::{ConsensusError, ConsensusResult};
use consensus_core::time::unix_now;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::Consensus;

struct QueuedBlock {
    block: Block,
    reply: oneshot::Sender<ConsensusResult<BlockStatus>>,
}

/// Process queue for blocks
pub struct ProcessQueue {
    consensus: Arc<Consensus>,
    sender: Mutex<Option<mpsc::Sender<QueuedBlock>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
}

impl ProcessQueue {
    /// Spawns the worker thread. The channel holds at most `process_queue_capacity` blocks;
    /// further submitters wait for room.
    pub fn start(consensus: Arc<Consensus>) -> ConsensusResult<Self> {
        let capacity = consensus.config().process_queue_capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<QueuedBlock>(capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_consensus = consensus.clone();
        let worker_shutdown = shutdown.clone();
        let worker = std::thread::Builder::new()
            .name("block-processor".to_string())
            .spawn(move || {
                // Cleared after a failed pruning step until the next block arrives
                let mut pruning_allowed = true;
                loop {
                    let pruning =
                        pruning_allowed && worker_consensus.config().enable_pruning && worker_consensus.pruning_pending();
                    let next = if pruning {
                        match receiver.try_recv() {
                            Ok(queued) => Some(queued),
                            Err(TryRecvError::Empty) => None,
                            Err(TryRecvError::Disconnected) => break,
                        }
                    } else {
                        match receiver.blocking_recv() {
                            Some(queued) => Some(queued),
                            None => break,
                        }
                    };

                    if let Some(QueuedBlock { block, reply }) = next {
                        let result = worker_consensus.process_validated_block(block);
                        // The submitter may have gone away; the block is processed regardless
                        let _ = reply.send(result);
                        pruning_allowed = true;
                    }
                    match worker_consensus.prune_if_needed(&worker_shutdown) {
                        Ok(_) => {}
                        Err(_) if worker_shutdown.load(Ordering::Relaxed) => debug!("pruning interrupted by shutdown"),
                        Err(err) => {
                            warn!("pruning failed: {}", err);
                            pruning_allowed = false;
                        }
                    }
                }
                debug!("block processor worker exiting");
            })
            .map_err(|err| ConsensusError::internal(format!("failed to spawn block processor: {err}")))?;

        info!("block process queue started with capacity {}", capacity);
        Ok(Self { consensus, sender: Mutex::new(Some(sender)), worker: Mutex::new(Some(worker)), shutdown })
    }

    /// Submits a block and waits for its outcome. A block too far in the future is held back until
    /// its timestamp fits the allowed offset and then processed; other isolation failures are
    /// returned immediately.
    pub async fn submit(&self, mut block: Block) -> ConsensusResult<BlockStatus> {
        block.finalize();
        if let Some(status) = self.consensus.known_block_status(&block)? {
            return Ok(status);
        }

        loop {
            match self.consensus.validate_block_in_isolation(&block) {
                Ok(()) => break,
                Err(err) if err.is_deferrable() => {
                    let wait = block.header.timestamp.saturating_sub(unix_now() + self.consensus.max_future_block_time_offset());
                    debug!("deferring block {} for {} ms: {}", block.hash(), wait, err);
                    tokio::time::sleep(Duration::from_millis(wait.max(1))).await;
                }
                Err(err) => return Err(self.consensus.reject_in_isolation(block.hash(), err)),
            }
        }

        let sender = self.sender.lock().clone().ok_or_else(|| ConsensusError::internal("process queue is shut down"))?;
        let (reply, outcome) = oneshot::channel();
        sender
            .send(QueuedBlock { block, reply })
            .await
            .map_err(|_| ConsensusError::internal("block processor is not running"))?;
        outcome.await.map_err(|_| ConsensusError::internal("block processor dropped the block"))?
    }

    /// Stops accepting blocks, lets the worker drain what is queued and joins it
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("block processor worker panicked");
            }
        }
        info!("block process queue stopped");
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }
}

impl Drop for ProcessQueue {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}
