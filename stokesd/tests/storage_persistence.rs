use consensus_core::api::ConsensusApi;
use consensus_core::blockstatus::BlockStatus;
use consensus_core::coinbase::MinerData;
use consensus_core::network::NetworkType;
use consensus_core::tx::ScriptPublicKey;
use std::time::Duration;
use stokesd::config::{Config, NetworkConfig, StorageConfig};
use stokesd::Daemon;
use tempfile::TempDir;

fn simnet_config(dir: &TempDir) -> Config {
    Config {
        network: NetworkConfig { network_id: NetworkType::Simnet },
        storage: StorageConfig { data_dir: dir.path().to_path_buf() },
        status_interval_secs: 1,
        ..Config::default()
    }
}

async fn run_until_stopped(daemon: Daemon) {
    let shutdown = daemon.shutdown_handle();
    let task = tokio::spawn(daemon.run());
    while !task.is_finished() {
        let _ = shutdown.send(());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_daemon_persists_blocks_across_restarts() {
    let dir = TempDir::new().unwrap();
    let config = simnet_config(&dir);
    assert!(config.consensus_db_dir().starts_with(dir.path()));

    let daemon = Daemon::new(config.clone()).unwrap();
    let consensus = daemon.consensus().clone();
    let genesis = consensus.config().genesis.hash();
    assert_eq!(consensus.get_sink(), genesis);

    let mut tip = genesis;
    for i in 0..5u8 {
        let miner_data = MinerData::new(ScriptPublicKey::from_vec(0, vec![0x51]), vec![i]);
        let block = consensus.build_block_with_parents(vec![tip], miner_data, vec![], None).unwrap();
        tip = block.hash();
        assert_eq!(daemon.queue().submit(block).await.unwrap(), BlockStatus::Active);
    }
    let state = consensus.virtual_state();
    drop(consensus);
    run_until_stopped(daemon).await;
    assert!(config.consensus_db_dir().exists());

    let daemon = Daemon::new(config).unwrap();
    let consensus = daemon.consensus().clone();
    assert_eq!(consensus.get_sink(), tip);
    assert_eq!(*consensus.virtual_state(), *state);
    assert_eq!(consensus.get_block_status(tip).unwrap(), BlockStatus::Active);
    drop(consensus);
    run_until_stopped(daemon).await;
}
