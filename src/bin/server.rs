//! pkgindex Server Binary
//!
//! Starts the TCP server for the package index.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pkgindex::network::Server;
use pkgindex::{Config, IndexStore};

/// pkgindex Server
#[derive(Parser, Debug)]
#[command(name = "pkgindex-server")]
#[command(about = "Concurrent TCP package dependency index server")]
#[command(version)]
struct Args {
    /// Host name or ip address to bind
    #[arg(short = 'o', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Shutdown grace period in milliseconds
    #[arg(short, long, default_value = "5000")]
    grace_ms: u64,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging; RUST_LOG overrides the CLI flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,pkgindex={}", args.log_level)));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("pkgindex Server v{}", pkgindex::VERSION);

    let config = Config::builder()
        .listen_addr(format!("{}:{}", args.host, args.port))
        .max_connections(args.max_connections)
        .shutdown_grace_ms(args.grace_ms)
        .build();

    let store = Arc::new(IndexStore::new());
    let mut server = Server::new(config, store);

    // Wire SIGINT/SIGTERM to graceful shutdown
    let handle = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received termination signal, initiating shutdown...");
        handle.shutdown();
    }) {
        tracing::warn!("Failed to install signal handler: {}", e);
    }

    if let Err(e) = server.bind() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
