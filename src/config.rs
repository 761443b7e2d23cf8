//! Relay configuration: defaults from the spec, overridable via CLI flags.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "haven-relay", version, about = "Haven relay — real-time chat broker")]
pub struct Args {
    /// Listen port for the WebSocket/health HTTP server
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Directory for the embedded store
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Inactivity window after which a user is eligible for cleanup
    #[arg(long, default_value = "90")]
    pub user_inactivity_days: u64,

    /// Inactivity window after which an empty room is eligible for cleanup
    #[arg(long, default_value = "7")]
    pub room_inactivity_days: u64,

    /// How long room messages are retained before cleanup purges them
    #[arg(long, default_value = "365")]
    pub message_retention_days: u64,

    /// Interval, in seconds, between cleanup sweeps
    #[arg(long, default_value = "3600")]
    pub cleanup_interval_secs: u64,
}

/// Runtime configuration for the relay, independent of how it was sourced.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub user_inactivity: Duration,
    pub room_inactivity: Duration,
    pub message_retention: Duration,
    pub cleanup_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: PathBuf::from("./data"),
            user_inactivity: Duration::from_secs(90 * 24 * 3600),
            room_inactivity: Duration::from_secs(7 * 24 * 3600),
            message_retention: Duration::from_secs(365 * 24 * 3600),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            port: args.port,
            data_dir: args.data_dir,
            user_inactivity: Duration::from_secs(args.user_inactivity_days * 24 * 3600),
            room_inactivity: Duration::from_secs(args.room_inactivity_days * 24 * 3600),
            message_retention: Duration::from_secs(args.message_retention_days * 24 * 3600),
            cleanup_interval: Duration::from_secs(args.cleanup_interval_secs),
        }
    }
}
