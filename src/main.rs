//! Feed aggregation service entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │              FEED AGGREGATOR                   │
//!                    │                                                │
//!   GET /feed/all    │  ┌────────┐   ┌────────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ aggregator │──▶│  breaker   │  │     ┌───────────┐
//!                    │  │ server │   │   (join)   │   │  registry  │──┼────▶│ directory │
//!                    │  └────────┘   └─────┬──────┘   └─────┬──────┘  │     └───────────┘
//!                    │                     │                │         │     ┌───────────┐
//!   200 (possibly    │               ┌─────▼──────┐   ┌─────▼──────┐──┼────▶│   posts   │
//!   ◀────────────────┼── degraded)   │  fallback  │   │  upstream  │  │     └───────────┘
//!                    │               │  provider  │   │   client   │  │
//!                    │               └────────────┘   └────────────┘  │
//!                    │                                                │
//!                    │  config · observability · lifecycle            │
//!                    └────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_aggregator::config::loader::load_config;
use feed_aggregator::config::FeedConfig;
use feed_aggregator::observability::metrics;
use feed_aggregator::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "feed-aggregator")]
#[command(about = "Resilient feed aggregation service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FeedConfig::default(),
    };

    // Initialize tracing subscriber
    let default_filter = format!(
        "feed_aggregator={},tower_http=info",
        config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("feed-aggregator v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        directory_url = %config.upstreams.directory_url,
        posts_url = %config.upstreams.posts_url,
        request_timeout_ms = config.upstreams.request_timeout_ms,
        failure_rate_threshold = config.breaker.failure_rate_threshold,
        sliding_window_size = config.breaker.sliding_window_size,
        "Configuration loaded"
    );

    // Initialize metrics exporter
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
    tracing::info!(address = %local_addr, "Listening for connections");

    // Create and run HTTP server
    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(&config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
