//! Wiring of the exporter services.
//!
//! [`initialize_services`] builds the HTTP transport from the configuration and hands
//! it to [`assemble_services`], which connects the remaining pieces:
//!
//! transport -> `RpcClient` -> `EvmBlockFetcher` -> `WindowAggregator` -> `CollectorService`
//!
//! with a `PrometheusSink` writing into the shared `ExporterMetrics` and `SnapshotStore`.

use std::{error::Error, sync::Arc};

use crate::{
	models::ExporterConfig,
	services::{
		aggregator::{AggregatorConfig, WindowAggregator},
		blockchain::{BlockchainTransport, EvmBlockFetcher, HttpTransportClient, RpcClient},
		collector::CollectorService,
		sink::{PrometheusSink, SnapshotStore},
	},
	utils::metrics::ExporterMetrics,
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Aggregator over a given transport
pub type ExporterAggregator<T> = WindowAggregator<EvmBlockFetcher<T>>;

/// Collector over a given transport
pub type ExporterCollector<T> = CollectorService<ExporterAggregator<T>, PrometheusSink>;

/// Everything the binary needs to run
pub struct ExporterServices<T = HttpTransportClient> {
	pub config: ExporterConfig,
	pub metrics: ExporterMetrics,
	pub store: SnapshotStore,
	pub fetcher: Arc<EvmBlockFetcher<T>>,
	pub sink: Arc<PrometheusSink>,
	pub collector: Arc<ExporterCollector<T>>,
}

/// Connects the services around an existing transport.
///
/// # Arguments
/// * `config` - Validated exporter configuration
/// * `transport` - JSON-RPC transport the fetcher calls through
///
/// # Errors
/// Returns an error if a metric series cannot be registered
pub fn assemble_services<T>(config: ExporterConfig, transport: T) -> Result<ExporterServices<T>>
where
	T: BlockchainTransport + 'static,
{
	let metrics = ExporterMetrics::new()?;
	let store = SnapshotStore::new();

	let rpc = RpcClient::new(transport, metrics.rpc());
	let fetcher = Arc::new(EvmBlockFetcher::new(rpc));
	let aggregator = Arc::new(WindowAggregator::new(
		fetcher.clone(),
		AggregatorConfig::from(&config),
	));
	let sink = Arc::new(PrometheusSink::new(metrics.clone(), store.clone()));
	let collector = Arc::new(CollectorService::new(
		aggregator,
		sink.clone(),
		config.collection_interval(),
	));

	Ok(ExporterServices {
		config,
		metrics,
		store,
		fetcher,
		sink,
		collector,
	})
}

/// Builds the HTTP transport and every service on top of it.
///
/// # Errors
/// Returns an error if no RPC endpoint is enabled or a metric series cannot be registered
pub async fn initialize_services(config: ExporterConfig) -> Result<ExporterServices> {
	let transport = HttpTransportClient::new(&config, None)
		.await
		.map_err(|e| format!("Failed to create RPC transport: {}", e))?;

	assemble_services(config, transport)
}
