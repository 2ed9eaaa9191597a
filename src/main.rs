//! Signed Ingestion Relay
//!
//! Accepts a JSON order submission, sanitizes it, signs it and forwards it
//! to the downstream processor.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                   INGEST RELAY                       │
//!                       │                                                      │
//!   Client Request      │  ┌─────────┐   ┌───────────┐   ┌──────────────┐      │
//!   ────────────────────┼─▶│  http   │──▶│  bounded  │──▶│   sanitize   │      │
//!                       │  │ server  │   │  reader   │   │   (rows)     │      │
//!                       │  └─────────┘   └───────────┘   └──────┬───────┘      │
//!                       │                                       │              │
//!                       │                                       ▼              │
//!                       │                ┌───────────┐   ┌──────────────┐      │
//!                       │                │  signer   │◀──│   payload    │      │
//!                       │                │ HMAC-256  │   │  assembler   │      │
//!                       │                └─────┬─────┘   └──────────────┘      │
//!                       │                      │                               │
//!   Client Response     │  ┌─────────┐   ┌─────▼─────┐                         │
//!   ◀───────────────────┼──│response │◀──│   relay   │─────────────────────────┼──▶ Downstream
//!                       │  │ mapping │   │  client   │                         │    Processor
//!                       │  └─────────┘   └───────────┘                         │
//!                       │                                                      │
//!                       │  config · observability · lifecycle                  │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ingest_relay::config::{loader, validate_config, ConfigError, RelayConfig};
use ingest_relay::lifecycle::{signals, Shutdown};
use ingest_relay::observability::{logging, metrics};
use ingest_relay::HttpServer;

#[derive(Parser)]
#[command(name = "ingest-relay")]
#[command(about = "Validate, sign and forward order submissions", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => loader::read_config(path)?,
        None => RelayConfig::default(),
    };
    loader::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("ingest-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.downstream.endpoint_url,
        asset_id = %config.downstream.asset_id,
        key_id = %config.downstream.key_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_watcher(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
