//! kvcache Server Binary
//!
//! Starts the TCP server for kvcache.

use std::time::Duration;

use clap::Parser;
use kvcache::{Config, Server, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// kvcache Server
#[derive(Parser, Debug)]
#[command(name = "kvcache-server")]
#[command(about = "In-memory key-value cache with TTLs")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Seconds between background sweeps of expired keys
    #[arg(short, long, default_value = "10")]
    sweep_interval_secs: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvcache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kvcache Server v{}", kvcache::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .sweep_interval(Duration::from_secs(args.sweep_interval_secs))
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    let store = Store::with_sweep_interval(config.sweep_interval);
    let mut server = Server::new(config, store);

    // Ctrl+C stops the accept loop; run() then stops the store
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
