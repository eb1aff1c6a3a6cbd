//! User interface utilities for better console output

use consensus_core::api::SyncInfo;
use std::fmt;
use std::time::Duration;

/// ANSI color codes for terminal output
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
}

/// Print startup banner
pub fn print_banner(version: &str, network: &str) {
    println!();
    println!("{}╔══════════════════════════════════════════════════════════════╗{}", colors::BRIGHT_CYAN, colors::RESET);
    println!(
        "{}║{}          {}STOKES BLOCKDAG NODE - STOKESD v{:<10}{}               {}║{}",
        colors::BRIGHT_CYAN,
        colors::RESET,
        colors::BOLD,
        version,
        colors::RESET,
        colors::BRIGHT_CYAN,
        colors::RESET
    );
    println!(
        "{}║{}  Network: {}{:<50}{}  {}║{}",
        colors::BRIGHT_CYAN,
        colors::RESET,
        colors::BRIGHT_GREEN,
        network,
        colors::RESET,
        colors::BRIGHT_CYAN,
        colors::RESET
    );
    println!("{}╚══════════════════════════════════════════════════════════════╝{}", colors::BRIGHT_CYAN, colors::RESET);
    println!();
}

/// Status types for colored output
#[derive(Debug, Clone, Copy)]
pub enum StatusType {
    Success,
    Info,
    Warning,
    Error,
}

/// Print status line with icon and color
pub fn print_status(icon: &str, message: &str, status: StatusType) {
    let color = match status {
        StatusType::Success => colors::BRIGHT_GREEN,
        StatusType::Info => colors::BRIGHT_CYAN,
        StatusType::Warning => colors::BRIGHT_YELLOW,
        StatusType::Error => colors::BRIGHT_RED,
    };
    println!("{}[{}]{} {}{}{}", color, icon, colors::RESET, color, message, colors::RESET);
}

/// Print a section header
pub fn print_section(title: &str) {
    println!();
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!("{}  {}{}{}", colors::BRIGHT_CYAN, colors::BOLD, title, colors::RESET);
    println!("{}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{}", colors::DIM, colors::RESET);
    println!();
}

/// Print key-value pair in a formatted way
pub fn print_kv(key: &str, value: &str) {
    println!("  {}{}:{} {}{}{}", colors::BRIGHT_WHITE, key, colors::RESET, colors::BRIGHT_CYAN, value, colors::RESET);
}

/// Print configuration summary
pub fn print_config_summary(config: &crate::config::Config) {
    print_section("Configuration");
    print_kv("Network", &config.network.network_id.to_string());
    print_kv("Data Directory", &config.consensus_db_dir().display().to_string());
    print_kv("Pruning", if config.consensus.enable_pruning { "Enabled" } else { "Archive" });
    print_kv("Process Queue", &config.consensus.process_queue_capacity.to_string());
    print_kv("Status Interval", &format!("{}s", config.status_interval_secs));
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Periodic node status summary
pub struct NodeStatus {
    pub uptime: Duration,
    pub sync_info: SyncInfo,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.sync_info;
        let synced = if info.is_synced { "synced" } else if info.is_nearly_synced { "nearly synced" } else { "behind" };
        write!(
            f,
            "uptime {}, {}: {} blocks ({} headers), {} tips, virtual blue score {}, daa score {}, sink {}, pruning point {}",
            format_duration(self.uptime),
            synced,
            info.block_count,
            info.header_count,
            info.tip_hashes.len(),
            info.virtual_blue_score,
            info.virtual_daa_score,
            info.sink,
            info.pruning_point
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
    }
}
