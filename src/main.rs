//! metric-sim: failure simulator for root-cause-analysis training.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     METRIC-SIM                       │
//!   GET /health   │  ┌────────────┐   ┌──────────────┐   ┌────────────┐  │
//!   ──────────────┼─▶│ instrument │──▶│   handlers   │──▶│   health   │  │
//!                 │  │ middleware │   │              │   │  reporter  │  │
//!   GET /process_ │  └─────┬──────┘   └──────┬───────┘   └─────┬──────┘  │
//!       order     │        │                 │                 ▼        │
//!   ──────────────┼────────┘                 ▼           ┌────────────┐  │
//!                 │                   ┌──────────────┐   │   fault    │  │
//!   GET /metrics  │                   │    order     │──▶│   state    │  │
//!   ──────────────┼──────────┐        │  processor   │   └────────────┘  │
//!                 │          ▼        └──────┬───────┘                   │
//!                 │  ┌──────────────────────────────────────────────┐   │
//!                 │  │ observability: metrics · logs · cluster events│   │
//!                 │  └──────────────────────────────────────────────┘   │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use metric_sim::lifecycle::{signals, startup, Shutdown};
use metric_sim::observability::logging::init_logging;
use metric_sim::HttpServer;

#[derive(Parser)]
#[command(name = "metric-sim")]
#[command(about = "Simulates intermittent backend failures for RCA exercises", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = startup::resolve_config(args.config.as_deref(), args.bind)?;
    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        error_labels = ?config.observability.error_labels,
        min_latency_ms = config.processing.min_latency_ms,
        max_latency_ms = config.processing.max_latency_ms,
        "Configuration loaded"
    );

    let telemetry = startup::build_telemetry(&config)?;
    let listener = startup::bind_listener(&config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config, telemetry);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
