use crate::config::Config;
use crate::ui;
use consensus::{Consensus, ProcessQueue};
use consensus_core::api::notifications::Notification;
use consensus_core::api::ConsensusApi;
use database::Database;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

pub struct Daemon {
    config: Config,
    shutdown_tx: broadcast::Sender<()>,
    consensus: Arc<Consensus>,
    queue: Arc<ProcessQueue>,
}

impl Daemon {
    /// Opens the consensus store and starts the block process queue
    pub fn new(config: Config) -> Result<Self, String> {
        ui::print_section("Initializing Components");
        let (shutdown_tx, _) = broadcast::channel(1);

        let db_dir = config.consensus_db_dir();
        std::fs::create_dir_all(&db_dir).map_err(|e| format!("Failed to create data directory: {}", e))?;
        info!("Opening consensus store at {:?}", db_dir);
        let db = Database::open(&db_dir).map_err(|e| format!("Failed to open DB: {}", e))?;

        info!("Initializing consensus engine");
        let consensus = Arc::new(
            Consensus::init(config.consensus_config(), db).map_err(|e| format!("Failed to initialize consensus: {}", e))?,
        );
        let queue = Arc::new(
            ProcessQueue::start(consensus.clone()).map_err(|e| format!("Failed to start process queue: {}", e))?,
        );

        ui::print_status("✓", "All components initialized successfully", ui::StatusType::Success);
        Ok(Self { config, shutdown_tx, consensus, queue })
    }

    pub fn consensus(&self) -> &Arc<Consensus> {
        &self.consensus
    }

    pub fn queue(&self) -> &Arc<ProcessQueue> {
        &self.queue
    }

    /// A handle that stops [`Daemon::run`] from another task
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Runs until Ctrl-C or a shutdown signal, then stops the queue and closes the store
    pub async fn run(self) -> Result<(), String> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let start_time = Instant::now();

        let notification_handle = {
            let mut notifications = self.consensus.subscribe();
            let mut shutdown = self.shutdown_tx.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        event = notifications.recv() => match event {
                            Ok(notification) => log_notification(&notification),
                            Err(broadcast::error::RecvError::Lagged(skipped)) => warn!("Skipped {} notifications", skipped),
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                        _ = shutdown.recv() => break,
                    }
                }
            })
        };

        let status_handle = {
            let consensus = self.consensus.clone();
            let period = Duration::from_secs(self.config.status_interval_secs.max(1));
            tokio::spawn(async move {
                let mut interval = interval(period);
                loop {
                    interval.tick().await;
                    match consensus.get_sync_info() {
                        Ok(sync_info) => info!("{}", ui::NodeStatus { uptime: start_time.elapsed(), sync_info }),
                        Err(e) => warn!("Failed to read sync info: {}", e),
                    }
                }
            })
        };

        ui::print_status("✓", "Stokes daemon is now running", ui::StatusType::Success);
        ui::print_status("ℹ", "Press Ctrl+C to stop the daemon", ui::StatusType::Info);

        self.wait_for_shutdown(shutdown_rx).await;

        status_handle.abort();
        // Both tasks must release their consensus handle before the store closes
        let _ = status_handle.await;
        let _ = notification_handle.await;
        self.stop()
    }

    fn stop(&self) -> Result<(), String> {
        info!("Stopping components");
        self.queue.shutdown();
        self.consensus.teardown().map_err(|e| format!("Failed to close consensus store: {}", e))?;
        info!("All components stopped");
        Ok(())
    }

    async fn wait_for_shutdown(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        tokio::select! {
            _ = signal::ctrl_c() => {
                ui::print_status("ℹ", "Received Ctrl+C, shutting down gracefully...", ui::StatusType::Warning);
                info!("Received Ctrl+C, shutting down");
            }
            _ = shutdown_rx.recv() => {
                info!("Received shutdown signal");
            }
        }

        // Broadcast shutdown to all components
        let _ = self.shutdown_tx.send(());
    }
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::BlockAdded { hash, blue_score, daa_score } => {
            debug!("Block {} added at blue score {}, daa score {}", hash, blue_score, daa_score)
        }
        Notification::VirtualChainChanged { removed_chain_block_hashes, added_chain_block_hashes, accepted_transaction_ids } => {
            if !removed_chain_block_hashes.is_empty() {
                info!("Reorg: {} chain blocks removed", removed_chain_block_hashes.len());
            }
            debug!(
                "Virtual chain changed: {} blocks added, {} transactions accepted",
                added_chain_block_hashes.len(),
                accepted_transaction_ids.len()
            );
        }
        Notification::VirtualDaaScoreChanged(score) => debug!("Virtual daa score {}", score),
        Notification::PruningPointAdvanced(hash) => info!("Pruning point advanced to {}", hash),
    }
}
