//! Prometheus series exposed by the exporter.
//!
//! - [`ExporterMetrics`] owns its own [`Registry`] and every series the exporter publishes.
//! - [`RpcMetrics`] is the slice of it that the RPC client updates live on every call.
//!
//! Series names are kept stable for existing scrape configurations, including the
//! `_last_10_blocks` suffixes which do not change with the configured window size.

pub mod server;

use prometheus::{
	Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounterVec, Opts, Registry,
	TextEncoder,
};

/// Label values used for `monad_collection_cycles_total{result}`.
pub const CYCLE_RESULT_LABELS: [&str; 3] = ["success", "partial", "failed"];

/// Histogram and counter updated by the RPC client.
///
/// Cloning is cheap; clones share the underlying series.
#[derive(Clone, Debug)]
pub struct RpcMetrics {
	/// Latency of every JSON-RPC call, success or failure
	pub response_time: Histogram,
	/// Failed calls, labeled by method
	pub errors: IntCounterVec,
}

impl RpcMetrics {
	/// Creates unregistered RPC series.
	///
	/// Useful for clients that are not wired to an exporter registry (tools, tests).
	pub fn new() -> Result<Self, prometheus::Error> {
		Ok(Self {
			response_time: Histogram::with_opts(HistogramOpts::new(
				"monad_rpc_response_time_seconds",
				"RPC response time in seconds",
			))?,
			errors: IntCounterVec::new(
				Opts::new("monad_rpc_errors_total", "Total number of RPC errors"),
				&["method"],
			)?,
		})
	}

	fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
		registry.register(Box::new(self.response_time.clone()))?;
		registry.register(Box::new(self.errors.clone()))?;
		Ok(())
	}
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
	let gauge = Gauge::new(name, help)?;
	registry.register(Box::new(gauge.clone()))?;
	Ok(gauge)
}

fn gauge_vec(
	registry: &Registry,
	name: &str,
	help: &str,
	labels: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
	let gauge = GaugeVec::new(Opts::new(name, help), labels)?;
	registry.register(Box::new(gauge.clone()))?;
	Ok(gauge)
}

/// Series keyed by block number, published only when per-block output is enabled.
#[derive(Clone, Debug)]
pub struct BlockSeries {
	pub gas_used: GaugeVec,
	pub gas_limit: GaugeVec,
	pub gas_utilization_percent: GaugeVec,
	pub size_bytes: GaugeVec,
	pub transaction_count: GaugeVec,
	pub transaction_types: GaugeVec,
	pub contract_calls: GaugeVec,
	pub simple_transfers: GaugeVec,
	pub unique_addresses: GaugeVec,
	pub value_transferred_wei: GaugeVec,
	pub avg_gas_price_wei: GaugeVec,
	pub max_gas_price_wei: GaugeVec,
	pub min_gas_price_wei: GaugeVec,
}

impl BlockSeries {
	fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
		let by_block = &["block_number"];
		Ok(Self {
			gas_used: gauge_vec(registry, "monad_block_gas_used", "Gas used in block", by_block)?,
			gas_limit: gauge_vec(registry, "monad_block_gas_limit", "Gas limit of block", by_block)?,
			gas_utilization_percent: gauge_vec(
				registry,
				"monad_block_gas_utilization_percent",
				"Gas utilization percentage of block",
				by_block,
			)?,
			size_bytes: gauge_vec(registry, "monad_block_size_bytes", "Block size in bytes", by_block)?,
			transaction_count: gauge_vec(
				registry,
				"monad_block_transaction_count",
				"Number of transactions in block",
				by_block,
			)?,
			transaction_types: gauge_vec(
				registry,
				"monad_transaction_types",
				"Transaction types in block",
				&["type", "block_number"],
			)?,
			contract_calls: gauge_vec(
				registry,
				"monad_contract_calls",
				"Number of contract calls in block",
				by_block,
			)?,
			simple_transfers: gauge_vec(
				registry,
				"monad_simple_transfers",
				"Number of simple transfers in block",
				by_block,
			)?,
			unique_addresses: gauge_vec(
				registry,
				"monad_unique_addresses",
				"Number of unique addresses in block",
				by_block,
			)?,
			value_transferred_wei: gauge_vec(
				registry,
				"monad_total_value_transferred_wei",
				"Total value transferred in block in wei",
				by_block,
			)?,
			avg_gas_price_wei: gauge_vec(
				registry,
				"monad_avg_gas_price_per_block_wei",
				"Average gas price in block in wei",
				by_block,
			)?,
			max_gas_price_wei: gauge_vec(
				registry,
				"monad_max_gas_price_per_block_wei",
				"Maximum gas price in block in wei",
				by_block,
			)?,
			min_gas_price_wei: gauge_vec(
				registry,
				"monad_min_gas_price_per_block_wei",
				"Minimum gas price in block in wei",
				by_block,
			)?,
		})
	}
}

/// Every series the exporter publishes, registered on one owned registry.
#[derive(Clone, Debug)]
pub struct ExporterMetrics {
	registry: Registry,
	rpc: RpcMetrics,

	// Chain head
	pub current_block_number: Gauge,
	pub gas_price_wei: Gauge,
	pub gas_price_gwei: Gauge,
	pub max_priority_fee_per_gas_wei: Gauge,

	// Current block
	pub current_block_gas_used: Gauge,
	pub current_block_gas_limit: Gauge,
	pub current_block_gas_utilization_percent: Gauge,
	pub current_block_size_bytes: Gauge,
	pub current_block_transaction_count: Gauge,
	pub current_block_base_fee_per_gas_wei: Gauge,
	pub last_block_timestamp: Gauge,

	// Window averages
	pub avg_block_time_seconds: Gauge,
	pub avg_transactions_per_block: Gauge,
	pub avg_gas_utilization_percent: Gauge,
	pub avg_gas_price_wei: Gauge,
	pub avg_unique_addresses_per_block: Gauge,
	pub transactions_per_second: Gauge,

	// Window totals
	pub transaction_types: GaugeVec,
	pub contract_calls: Gauge,
	pub simple_transfers: Gauge,
	pub total_value_transferred_wei: Gauge,
	pub window_blocks_fetched: Gauge,
	pub decode_defaulted_quantities: Gauge,

	pub chain_info: GaugeVec,

	pub collection_time_seconds: Gauge,
	pub collection_cycles_total: IntCounterVec,

	pub blocks: BlockSeries,
}

impl ExporterMetrics {
	/// Creates and registers every series on a fresh registry.
	///
	/// # Errors
	///
	/// Returns the `prometheus::Error` of the first series that fails to build or register.
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Registry::new();
		let r = &registry;

		let rpc = RpcMetrics::new()?;
		rpc.register(r)?;

		let collection_cycles_total = IntCounterVec::new(
			Opts::new(
				"monad_collection_cycles_total",
				"Collection cycles by outcome",
			),
			&["result"],
		)?;
		r.register(Box::new(collection_cycles_total.clone()))?;
		for label in CYCLE_RESULT_LABELS {
			collection_cycles_total.with_label_values(&[label]);
		}

		let metrics = Self {
			current_block_number: gauge(r, "monad_current_block_number", "Current block number")?,
			gas_price_wei: gauge(r, "monad_gas_price_wei", "Current gas price in wei")?,
			gas_price_gwei: gauge(r, "monad_gas_price_gwei", "Current gas price in gwei")?,
			max_priority_fee_per_gas_wei: gauge(
				r,
				"monad_max_priority_fee_per_gas_wei",
				"Max priority fee per gas in wei",
			)?,
			current_block_gas_used: gauge(
				r,
				"monad_current_block_gas_used",
				"Gas used in current block",
			)?,
			current_block_gas_limit: gauge(
				r,
				"monad_current_block_gas_limit",
				"Gas limit of current block",
			)?,
			current_block_gas_utilization_percent: gauge(
				r,
				"monad_current_block_gas_utilization_percent",
				"Gas utilization percentage of current block",
			)?,
			current_block_size_bytes: gauge(
				r,
				"monad_current_block_size_bytes",
				"Size of current block in bytes",
			)?,
			current_block_transaction_count: gauge(
				r,
				"monad_current_block_transaction_count",
				"Number of transactions in current block",
			)?,
			current_block_base_fee_per_gas_wei: gauge(
				r,
				"monad_current_block_base_fee_per_gas_wei",
				"Base fee per gas of current block in wei",
			)?,
			last_block_timestamp: gauge(
				r,
				"monad_last_block_timestamp",
				"Timestamp of the last block",
			)?,
			avg_block_time_seconds: gauge(
				r,
				"monad_avg_block_time_seconds",
				"Average block time in seconds",
			)?,
			avg_transactions_per_block: gauge(
				r,
				"monad_avg_transactions_per_block",
				"Average transactions per block",
			)?,
			avg_gas_utilization_percent: gauge(
				r,
				"monad_avg_gas_utilization_percent",
				"Average gas utilization percentage",
			)?,
			avg_gas_price_wei: gauge(r, "monad_avg_gas_price_wei", "Average gas price in wei")?,
			avg_unique_addresses_per_block: gauge(
				r,
				"monad_avg_unique_addresses_per_block",
				"Average unique addresses per block",
			)?,
			transactions_per_second: gauge(
				r,
				"monad_transactions_per_second",
				"Transactions per second",
			)?,
			transaction_types: gauge_vec(
				r,
				"monad_transaction_types_last_10_blocks",
				"Transaction types in the sampled window",
				&["type"],
			)?,
			contract_calls: gauge(
				r,
				"monad_contract_calls_last_10_blocks",
				"Number of contract calls in the sampled window",
			)?,
			simple_transfers: gauge(
				r,
				"monad_simple_transfers_last_10_blocks",
				"Number of simple transfers in the sampled window",
			)?,
			total_value_transferred_wei: gauge(
				r,
				"monad_total_value_transferred_wei_last_10_blocks",
				"Total value transferred in the sampled window in wei",
			)?,
			window_blocks_fetched: gauge(
				r,
				"monad_window_blocks_fetched",
				"Blocks successfully folded in the last window",
			)?,
			decode_defaulted_quantities: gauge(
				r,
				"monad_decode_defaulted_quantities",
				"Malformed quantities decoded as zero in the last cycle",
			)?,
			chain_info: gauge_vec(
				r,
				"monad_chain_info",
				"Chain information",
				&["chain_id", "client_version", "network"],
			)?,
			collection_time_seconds: gauge(
				r,
				"monad_metrics_collection_time_seconds",
				"Time taken to collect metrics",
			)?,
			blocks: BlockSeries::new(r)?,
			collection_cycles_total,
			rpc,
			registry,
		};

		Ok(metrics)
	}

	/// Series the RPC client updates on every call.
	pub fn rpc(&self) -> RpcMetrics {
		self.rpc.clone()
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Gathers every registered series in the text exposition format.
	pub fn gather(&self) -> Result<Vec<u8>, prometheus::Error> {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		let mut buffer = Vec::new();
		encoder.encode(&metric_families, &mut buffer)?;
		Ok(buffer)
	}
}
