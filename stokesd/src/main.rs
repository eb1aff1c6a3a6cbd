use std::process;
use stokesd::{cli, ui, Config, Daemon};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = cli::parse_args();

    // Load configuration (file, else per-network defaults)
    let mut config = match (&args.config_path, &args.network) {
        (Some(path), _) => Config::load(path),
        (None, Some(network)) => Config::for_network(network),
        (None, None) => Ok(Config::default()),
    }
    .unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        process::exit(1);
    });
    if let Err(e) = config.apply_cli_overrides(&args) {
        eprintln!("Invalid arguments: {}", e);
        process::exit(1);
    }

    init_logging(&args);
    ui::print_banner(env!("CARGO_PKG_VERSION"), &config.network.network_id.to_string());
    ui::print_config_summary(&config);

    let daemon = match Daemon::new(config) {
        Ok(d) => d,
        Err(e) => {
            ui::print_status("✗", &format!("Failed to initialize daemon: {}", e), ui::StatusType::Error);
            error!("Failed to initialize daemon: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = daemon.run().await {
        ui::print_status("✗", &format!("Daemon error: {}", e), ui::StatusType::Error);
        error!("Daemon error: {}", e);
        process::exit(1);
    }

    ui::print_status("✓", "Stokes daemon stopped gracefully", ui::StatusType::Success);
    info!("Stokes daemon stopped gracefully");
}

fn init_logging(args: &cli::Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).with_target(true).with_thread_ids(true).init();
}
