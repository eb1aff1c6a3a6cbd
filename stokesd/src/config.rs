use consensus_core::config::constants::perf;
use consensus_core::config::params::Params;
use consensus_core::network::NetworkType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub consensus: ConsensusConfig,
    pub status_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: NetworkType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Local engine settings. Consensus parameters themselves follow the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub process_queue_capacity: usize,
    pub enable_pruning: bool,
    pub pruning_batch_size: usize,
}

impl Config {
    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
        Ok(toml::from_str(&content)?)
    }

    /// Default configuration for network
    pub fn for_network(network: &str) -> Result<Self, ConfigError> {
        let network_id = NetworkType::from_str(network).map_err(|_| ConfigError::UnknownNetwork(network.to_string()))?;
        Ok(Config { network: NetworkConfig { network_id }, ..Config::default() })
    }

    /// Override config with CLI arguments
    pub fn apply_cli_overrides(&mut self, args: &crate::cli::Args) -> Result<(), ConfigError> {
        if let Some(network) = &args.network {
            self.network.network_id =
                NetworkType::from_str(network).map_err(|_| ConfigError::UnknownNetwork(network.clone()))?;
        }
        if let Some(data_dir) = &args.data_dir {
            self.storage.data_dir = data_dir.clone();
        }
        if args.archive {
            self.consensus.enable_pruning = false;
        }
        if let Some(secs) = args.status_interval_secs {
            self.status_interval_secs = secs;
        }
        Ok(())
    }

    /// Consensus store location: `<data_dir>/<network>/consensus`
    pub fn consensus_db_dir(&self) -> PathBuf {
        self.storage.data_dir.join(self.network.network_id.to_string()).join("consensus")
    }

    pub fn consensus_config(&self) -> consensus_core::config::Config {
        let mut config = consensus_core::config::Config::new(Params::from(self.network.network_id));
        config.process_queue_capacity = self.consensus.process_queue_capacity;
        config.enable_pruning = self.consensus.enable_pruning;
        config.pruning_batch_size = self.consensus.pruning_batch_size;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig { network_id: NetworkType::Mainnet },
            storage: StorageConfig { data_dir: PathBuf::from("./data") },
            consensus: ConsensusConfig::default(),
            status_interval_secs: 30,
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            process_queue_capacity: perf::PROCESS_QUEUE_CAPACITY,
            enable_pruning: true,
            pruning_batch_size: perf::PRUNING_BATCH_SIZE,
        }
    }
}
