//! dhub CLI
//!
//! Command-line interface for managing tables.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use dhub::cli::{execute, TableCommand};
use dhub::config::{BackupPolicy, Config};
use dhub::TableStore;
use tracing_subscriber::{fmt, EnvFilter};

/// dhub CLI
#[derive(Parser, Debug)]
#[command(name = "dhub")]
#[command(about = "Manage dhub tables")]
#[command(version)]
#[command(group(
    ArgGroup::new("command")
        .required(true)
        .args(["list", "create", "delete"])
))]
struct Args {
    /// List tables
    #[arg(long)]
    list: bool,

    /// Create table
    #[arg(long, value_name = "TABLE_NAME")]
    create: Option<String>,

    /// Delete table
    #[arg(long, value_name = "TABLE_NAME")]
    delete: Option<String>,

    /// Data directory
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Backup policy: none | on_update
    #[arg(short, long, default_value = "none")]
    backup_policy: BackupPolicy,

    /// Working directory for backup git commands
    #[arg(long, default_value = ".")]
    backup_repo: PathBuf,
}

impl Args {
    fn command(&self) -> TableCommand {
        match (&self.create, &self.delete) {
            (Some(name), _) => TableCommand::Create(name.clone()),
            (_, Some(name)) => TableCommand::Delete(name.clone()),
            _ => TableCommand::List,
        }
    }
}

fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries command output only
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .backup_policy(args.backup_policy)
        .backup_repo(&args.backup_repo)
        .build();

    let store = match TableStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    match execute(&store, &args.command(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}
