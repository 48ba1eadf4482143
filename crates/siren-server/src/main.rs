//! sirenvault server binary.
//!
//! Ingests Alertmanager webhook deliveries and serves per-tenant alert
//! history queries.

use std::path::PathBuf;

use clap::Parser;
use siren_server::{Server, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sirenvault", about = "Tenant-scoped alert history service")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "SIRENVAULT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        addr = %config.http_listen_address,
        backend = %config.backend,
        "starting sirenvault"
    );

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(err) => {
            error!("failed to start: {err}");
            std::process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {err}");
        }
        info!("shutdown requested");
    };

    if let Err(err) = server.serve_with_shutdown(shutdown).await {
        error!("server error: {err}");
        std::process::exit(1);
    }
}
