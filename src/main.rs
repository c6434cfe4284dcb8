//! Sheets API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup:   config → logging → database (retry) → bind listener → serve
//!
//!   request:   request id → trace → catch panic → origin policy → timeout
//!                  → /health | /debug/cookies | /auth/* | /api/sheets/*
//!                  → error normalizer ({message, code})
//!
//!   shutdown:  SIGINT/SIGTERM → drain → close database → exit 0/1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use sheets_gateway::config::{load_config, GatewayConfig};
use sheets_gateway::database::{ConnectionSupervisor, TcpStoreClient};
use sheets_gateway::lifecycle::{signals, LifecycleController, EXIT_FAILURE};
use sheets_gateway::observability::{logging, metrics};
use sheets_gateway::routing::RouteGroups;

#[derive(Parser)]
#[command(name = "sheets-gateway")]
#[command(about = "HTTP gateway for the sheets backend", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let fallback = GatewayConfig::default();
            logging::init_logging(&fallback.observability, fallback.environment);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    logging::init_logging(&config.observability, config.environment);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sheets-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        environment = ?config.environment,
        max_attempts = config.database.max_attempts,
        request_timeout_secs = config.timeouts.request_secs,
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

    let client = match TcpStoreClient::from_url(
        &config.database.url,
        Duration::from_millis(config.database.connect_timeout_ms),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Invalid database configuration");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let supervisor = Arc::new(ConnectionSupervisor::new(
        Arc::new(client),
        config.database.clone(),
    ));
    let controller = LifecycleController::new(config, supervisor, RouteGroups::default());

    let report = controller.run(signals::wait_for_termination()).await;
    ExitCode::from(report.exit_code)
}
