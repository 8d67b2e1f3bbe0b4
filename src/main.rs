//! Handler dispatch server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                 DISPATCH SERVER                  │
//!                    │                                                  │
//!   Client Request   │  ┌─────────┐    ┌────────────┐    ┌──────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ dispatcher │───▶│ registry │   │
//!                    │  │ server  │    │            │    │ (frozen) │   │
//!                    │  └─────────┘    └─────┬──────┘    └──────────┘   │
//!                    │                       │                          │
//!                    │                       ▼                          │
//!   Client Response  │  ┌─────────┐    ┌────────────┐                   │
//!   ◀────────────────┼──│exchange │◀───│  handler   │                   │
//!                    │  │ (reply) │    │ + access   │                   │
//!                    │  └─────────┘    └────────────┘                   │
//!                    │                                                  │
//!                    │  config · observability · lifecycle              │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use handler_dispatch::config::{load_config, ServerConfig};
use handler_dispatch::handlers;
use handler_dispatch::lifecycle::{signals, startup, Shutdown};
use handler_dispatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "handler-dispatch")]
#[command(about = "Priority-ordered HTTP handler dispatch server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Print the handler registry as JSON and exit.
    #[arg(long)]
    print_routes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("handler-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = startup::build_registry(handlers::registrations(), &config)?;

    // Stdout holds only the JSON document; logs are on stderr
    if cli.print_routes {
        println!("{}", serde_json::to_string_pretty(&registry.summary())?);
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        routes = registry.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = handler_dispatch::HttpServer::with_registry(config, registry);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            if !shutdown.is_triggered() {
                tracing::warn!("HTTP server exited before a shutdown signal");
            }
            result??;
        }
        _ = signals::wait_for_shutdown() => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
