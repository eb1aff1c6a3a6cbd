use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "stokesd")]
#[command(about = "Stokes blockDAG consensus node daemon", long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file (per-network defaults are used when absent)
    #[arg(short, long = "config")]
    pub config_path: Option<PathBuf>,

    /// Data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Network (mainnet, testnet, devnet, simnet)
    #[arg(short, long)]
    pub network: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Run as archive node (keep full history)
    #[arg(long)]
    pub archive: bool,

    /// Seconds between two sync status reports
    #[arg(long)]
    pub status_interval_secs: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "stokesd",
            "--config",
            "node.toml",
            "--data-dir",
            "/tmp/stokes",
            "--network",
            "simnet",
            "--archive",
            "--status-interval-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(args.config_path, Some(PathBuf::from("node.toml")));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/stokes")));
        assert_eq!(args.network.as_deref(), Some("simnet"));
        assert_eq!(args.log_level, "info");
        assert!(args.archive);
        assert_eq!(args.status_interval_secs, Some(5));
    }
}
