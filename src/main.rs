//! Edge Router
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   EDGE ROUTER                     │
//!     Client Request      │  ┌─────────┐    ┌──────────┐                      │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │──┬─▶ proxy ──────────┼──▶ comment / gist API
//!                         │  │ server  │    │ (rules)  │  │                   │
//!                         │  └─────────┘    └──────────┘  ├─▶ analytics ──────┼──▶ collector (background)
//!                         │                               │    admission      │
//!                         │                               │    session        │
//!                         │                               ├─▶ redirect        │
//!                         │                               └─▶ assets ─────────┼──▶ asset store
//!     Client Response     │  ┌──────────┐                      cache tiers    │
//!     ◀───────────────────┼──│ response │◀─────────────────────────────────────│
//!                         │  └──────────┘                                     │
//!                         │  config · observability · lifecycle · security    │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_router::config::{load_config, EdgeConfig};
use edge_router::observability::{logging, metrics};
use edge_router::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Edge request router for a static content site", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("edge-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        assets_root = %config.assets.root,
        allow_list = config.analytics.allow_list.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
