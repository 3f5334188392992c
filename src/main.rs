//! Monad exporter entry point.
//!
//! Loads the configuration, starts the metrics server and runs collection cycles until
//! Ctrl+C.
//!
//! # Flow
//! 1. Applies CLI options to the environment and loads `.env`
//! 2. Sets up logging
//! 3. Loads and validates the exporter configuration
//! 4. Builds the RPC transport, aggregator, sink and collector
//! 5. Serves `/metrics` while the collector runs on its interval
//! 6. Stops the collector and the server on Ctrl+C

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{initialize_services, Result},
	models::ExporterConfig,
	services::blockchain::redact_url,
	utils::{
		logging::setup_logging, metrics::server::create_metrics_server,
		parse_string_to_bytes_size,
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};

const DEFAULT_METRICS_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Parser)]
#[command(
	name = "monad-exporter",
	about = "Prometheus exporter that aggregates recent Monad blocks over JSON-RPC.",
	version
)]
struct Cli {
	/// Path to the exporter configuration file (default: config/exporter.json if present)
	#[arg(long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// RPC endpoint, replacing the configured list
	#[arg(long, value_name = "URL")]
	rpc_url: Option<String>,

	/// API key appended to the RPC URL as `dkey`
	#[arg(long, value_name = "KEY")]
	rpc_key: Option<String>,

	/// Collection interval in seconds
	#[arg(long, value_name = "SECONDS")]
	interval: Option<u64>,

	/// Number of trailing blocks analyzed per cycle
	#[arg(long, value_name = "BLOCKS")]
	window_size: Option<u64>,

	/// Publish block-number labeled series
	#[arg(long)]
	per_block_series: bool,

	/// Address to start the metrics server on (default: 127.0.0.1:8080)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Validate the configuration without starting the exporter
	#[arg(long)]
	check: bool,

	/// Run a single collection cycle, print the snapshot and exit
	#[arg(long)]
	once: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if let Some(url) = &self.rpc_url {
			set_var("MONAD_RPC_URL", url);
		}

		if let Some(key) = &self.rpc_key {
			set_var("MONAD_RPC_KEY", key);
		}

		if let Some(interval) = self.interval {
			set_var("POLL_INTERVAL", interval.to_string());
		}

		if let Some(window_size) = self.window_size {
			set_var("WINDOW_SIZE", window_size.to_string());
		}

		if self.per_block_series {
			set_var("PER_BLOCK_SERIES", "true");
		}

		if let Some(address) = &self.metrics_address {
			set_var("METRICS_ADDRESS", address);
		}
	}
}

/// Main entry point for the exporter.
///
/// # Errors
/// Returns an error if the configuration is invalid or the services cannot be built.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config = match ExporterConfig::load(cli.config.as_deref()).await {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return Err(Box::new(e) as Box<dyn std::error::Error>);
		}
	};

	if cli.check {
		info!(
			name = %config.name,
			endpoints = config.rpc_urls.len(),
			window_size = config.window_size,
			interval = ?config.collection_interval(),
			"Configuration is valid"
		);
		return Ok(());
	}

	for rpc_url in &config.rpc_urls {
		info!(
			url = %redact_url(rpc_url.url.as_str()),
			weight = rpc_url.weight,
			"Configured RPC endpoint"
		);
	}

	let services = initialize_services(config).await?;

	if cli.once {
		let snapshot = services.collector.collect_once().await?;
		info!(snapshot = %serde_json::to_string_pretty(snapshot.as_ref())?, "Collected snapshot");
		return Ok(());
	}

	let metrics_address =
		var("METRICS_ADDRESS").unwrap_or_else(|_| DEFAULT_METRICS_ADDRESS.to_string());
	let metrics_server = create_metrics_server(
		metrics_address,
		services.metrics.clone(),
		services.store.clone(),
	)?;
	let server_handle = metrics_server.handle();

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let collector = services.collector.clone();
	let collector_task = tokio::spawn(async move { collector.run(shutdown_rx).await });

	info!(
		network = %services.config.network,
		window_size = services.config.window_size,
		"Exporter started. Press Ctrl+C to shutdown"
	);

	tokio::select! {
		result = tokio::signal::ctrl_c() => {
			if let Err(e) = result {
				error!("Error waiting for Ctrl+C: {}", e);
			}
			info!("Shutdown signal received, stopping services...");
		}
		result = metrics_server => {
			if let Err(e) = result {
				error!("Metrics server error: {}", e);
			}
			info!("Metrics server stopped, shutting down services...");
		}
	}

	let _ = shutdown_tx.send(true);
	server_handle.stop(true).await;

	match collector_task.await {
		Ok(Ok(())) => {}
		Ok(Err(e)) => error!("Collector stopped with error: {}", e),
		Err(e) => error!("Collector task panicked: {}", e),
	}

	info!("Shutdown complete");
	Ok(())
}
