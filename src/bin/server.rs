//! dhub Server Binary
//!
//! Serves tables over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dhub::config::{BackupMode, BackupPolicy, Config};
use dhub::network::Server;
use dhub::TableStore;
use tracing_subscriber::{fmt, EnvFilter};

/// dhub Server
#[derive(Parser, Debug)]
#[command(name = "dhub-server")]
#[command(about = "HTTP API for dhub tables")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8000", conflicts_with = "port")]
    listen: String,

    /// Listen on 0.0.0.0:<PORT>
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Backup policy: none | on_update
    #[arg(short, long, default_value = "on_update")]
    backup_policy: BackupPolicy,

    /// Backup dispatch: inline | background
    #[arg(long, default_value = "background")]
    backup_mode: BackupMode,

    /// Working directory for backup git commands
    #[arg(long, default_value = ".")]
    backup_repo: PathBuf,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dhub=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let listen = match args.port {
        Some(port) => format!("0.0.0.0:{}", port),
        None => args.listen.clone(),
    };

    tracing::info!("dhub server v{}", dhub::VERSION);
    tracing::info!("Data directory: {}", args.data_dir.display());
    tracing::info!("Backup: {} ({})", args.backup_policy, args.backup_mode);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(listen)
        .max_connections(args.max_connections)
        .backup_policy(args.backup_policy)
        .backup_mode(args.backup_mode)
        .backup_repo(&args.backup_repo)
        .build();

    let store = match TableStore::open(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open table store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Table store ready ({} tables)", store.table_count());

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
