//! # Catalog Sync
//!
//! Pushes the bundled medicine catalog to the canonical store once.
//!
//! ## Usage
//! ```bash
//! # Sync against the REST backend from medi.toml / MEDI_REMOTE_URL
//! cargo run -p medi-sync --bin catalog-sync
//!
//! # Use a specific config file
//! cargo run -p medi-sync --bin catalog-sync -- --config ./medi.toml
//!
//! # Sync into a local SQLite canonical store instead
//! cargo run -p medi-sync --bin catalog-sync -- --db ./medi.db
//! ```
//!
//! Exits with status 1 when any record failed to sync.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use medi_core::{CatalogStore, SyncProgress, SyncResult};
use medi_db::{Database, DbConfig};
use medi_sync::{RemoteCatalog, RestCatalogClient, SqliteCatalog, SyncConfig, SyncOrchestrator};
use tokio_util::sync::CancellationToken;

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show per-batch messages
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medi_sync=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

fn print_help() {
    println!("Medi Catalog Sync");
    println!();
    println!("Usage: catalog-sync [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir/medi.toml)");
    println!("  -d, --db <PATH>      Sync into this SQLite file instead of the REST backend");
    println!("  -h, --help           Show this help message");
}

fn print_summary(result: &SyncResult) {
    println!();
    println!("Processed: {}", result.total_processed);
    println!("Inserted:  {}", result.inserted);
    println!("Updated:   {}", result.updated);
    println!("Errors:    {}", result.errors);
    println!("Duration:  {} ms", result.duration_ms);

    for detail in result.error_details.iter().take(20) {
        eprintln!("  ✗ {}: {}", detail.id, detail.message);
    }
    if result.error_details.len() > 20 {
        eprintln!("  … and {} more", result.error_details.len() - 20);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(ExitCode::SUCCESS);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_help();
                return Ok(ExitCode::from(2));
            }
        }
        i += 1;
    }

    init_tracing();

    let config = SyncConfig::load(config_path)?;
    let store = Arc::new(CatalogStore::bundled()?);

    let remote: Arc<dyn RemoteCatalog> = match db_path {
        Some(path) => {
            println!("Target: SQLite {}", path.display());
            let db = Database::new(DbConfig::new(path)).await?;
            Arc::new(SqliteCatalog::new(Arc::new(db)))
        }
        None => {
            let base_url = config
                .remote_url()
                .ok_or("No remote configured: set [remote] base_url, MEDI_REMOTE_URL or --db")?;
            println!("Target: {base_url}");
            let api_key = config.remote.api_key.clone().unwrap_or_default();
            Arc::new(RestCatalogClient::new(
                base_url,
                api_key,
                config.request_timeout(),
            )?)
        }
    };

    println!("Records: {}", store.len());
    println!("Batch size: {}", config.sync.batch_size);
    println!();

    let orchestrator = SyncOrchestrator::new(store, remote, config.sync_options());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping after the current batch");
            on_ctrl_c.cancel();
        }
    });

    let progress = |p: &SyncProgress| {
        println!("[{:>3}%] {}/{} {}", p.percentage, p.current, p.total, p.status);
    };

    let result = orchestrator.run(&progress, cancel).await?;
    print_summary(&result);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
