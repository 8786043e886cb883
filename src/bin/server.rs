//! hashlog Server Binary
//!
//! Starts the TCP server for hashlog.

use std::sync::Arc;

use clap::Parser;
use hashlog::network::Server;
use hashlog::{Config, Registry, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// hashlog Server
#[derive(Parser, Debug)]
#[command(name = "hashlog-server")]
#[command(about = "Append-only log-structured key-value store")]
#[command(version)]
struct Args {
    /// Directory holding one log file per database handle
    #[arg(short, long, default_value = "./hashlog_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Maximum queued or active connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// fsync after every write instead of every N writes
    #[arg(long)]
    sync_every_write: bool,

    /// Databases to open at startup
    #[arg(long = "open", value_name = "DB")]
    open: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hashlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("hashlog server v{}", hashlog::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.sync_every_write {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::EveryNEntries { count: 100 }
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .sync_strategy(sync_strategy)
        .build();

    let registry = Arc::new(Registry::new(config.clone()));
    for db in &args.open {
        if let Err(e) = registry.open(db) {
            tracing::error!("Failed to open database {}: {}", db, e);
            std::process::exit(1);
        }
    }

    let server = match Server::bind(config, Arc::clone(&registry)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = registry.close_all() {
        tracing::error!("Failed to close databases: {}", e);
    }
    tracing::info!("Server stopped");
}
