//! Projection of [`ChainSnapshot`] onto the Prometheus series.
//!
//! Nothing is computed here: every series is a copy of one snapshot field. Label
//! values that carry numbers are decimal strings.

use async_trait::async_trait;
use prometheus::GaugeVec;
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
	models::{BlockBreakdown, ChainSnapshot},
	services::{
		collector::CycleResult,
		sink::{error::SinkError, store::SnapshotStore, MetricsSink},
	},
	utils::metrics::ExporterMetrics,
};

/// [`MetricsSink`] writing into an [`ExporterMetrics`] registry
#[derive(Clone, Debug)]
pub struct PrometheusSink {
	metrics: ExporterMetrics,
	store: SnapshotStore,
}

fn set_labeled(series: &GaugeVec, name: &str, labels: &[&str], value: f64) -> Result<(), SinkError> {
	series
		.get_metric_with_label_values(labels)
		.map(|gauge| gauge.set(value))
		.map_err(|e| {
			SinkError::metric_error(
				format!("failed to resolve {}", name),
				Some(Box::new(e)),
				Some(HashMap::from([("labels".to_string(), labels.join(","))])),
			)
		})
}

impl PrometheusSink {
	pub fn new(metrics: ExporterMetrics, store: SnapshotStore) -> Self {
		Self { metrics, store }
	}

	pub fn metrics(&self) -> &ExporterMetrics {
		&self.metrics
	}

	pub fn store(&self) -> &SnapshotStore {
		&self.store
	}

	fn project(&self, snapshot: &ChainSnapshot) -> Result<(), SinkError> {
		let m = &self.metrics;

		m.current_block_number.set(snapshot.block_number as f64);
		m.gas_price_wei.set(snapshot.gas_price_wei);
		m.gas_price_gwei.set(snapshot.gas_price_gwei);
		m.max_priority_fee_per_gas_wei
			.set(snapshot.max_priority_fee_per_gas_wei);

		let current = &snapshot.current_block;
		m.current_block_gas_used.set(current.gas_used);
		m.current_block_gas_limit.set(current.gas_limit);
		m.current_block_gas_utilization_percent
			.set(current.gas_utilization_percent);
		m.current_block_size_bytes.set(current.size_bytes);
		m.current_block_transaction_count
			.set(current.transaction_count as f64);
		m.current_block_base_fee_per_gas_wei
			.set(current.base_fee_per_gas_wei);
		m.last_block_timestamp.set(current.timestamp as f64);

		m.avg_block_time_seconds.set(snapshot.avg_block_time_seconds);
		m.avg_transactions_per_block
			.set(snapshot.avg_transactions_per_block);
		m.avg_gas_utilization_percent
			.set(snapshot.avg_gas_utilization_percent);
		m.avg_gas_price_wei.set(snapshot.avg_gas_price_wei);
		m.avg_unique_addresses_per_block
			.set(snapshot.avg_unique_addresses_per_block);
		m.transactions_per_second.set(snapshot.transactions_per_second);

		for (kind, count) in &snapshot.transaction_kinds {
			set_labeled(
				&m.transaction_types,
				"monad_transaction_types_last_10_blocks",
				&[kind.label()],
				*count as f64,
			)?;
		}
		m.contract_calls.set(snapshot.contract_calls as f64);
		m.simple_transfers.set(snapshot.simple_transfers as f64);
		m.total_value_transferred_wei
			.set(snapshot.total_value_transferred_wei);
		m.window_blocks_fetched
			.set(snapshot.window_blocks_fetched as f64);
		m.decode_defaulted_quantities
			.set(snapshot.decode_defaulted_quantities as f64);

		let chain = &snapshot.chain;
		if !chain.chain_id.is_empty() {
			set_labeled(
				&m.chain_info,
				"monad_chain_info",
				&[
					chain.chain_id.as_str(),
					chain.client_version.as_str(),
					chain.network.as_str(),
				],
				1.0,
			)?;
		}

		for block in &snapshot.blocks {
			self.project_block(block)?;
		}

		Ok(())
	}

	fn project_block(&self, block: &BlockBreakdown) -> Result<(), SinkError> {
		let series = &self.metrics.blocks;
		let number = block.number.to_string();
		let by_block = [number.as_str()];

		let values: [(&GaugeVec, &str, f64); 12] = [
			(&series.gas_used, "monad_block_gas_used", block.gas_used),
			(&series.gas_limit, "monad_block_gas_limit", block.gas_limit),
			(
				&series.gas_utilization_percent,
				"monad_block_gas_utilization_percent",
				block.gas_utilization_percent,
			),
			(&series.size_bytes, "monad_block_size_bytes", block.size_bytes),
			(
				&series.transaction_count,
				"monad_block_transaction_count",
				block.transaction_count as f64,
			),
			(
				&series.contract_calls,
				"monad_contract_calls",
				block.contract_calls as f64,
			),
			(
				&series.simple_transfers,
				"monad_simple_transfers",
				block.simple_transfers as f64,
			),
			(
				&series.unique_addresses,
				"monad_unique_addresses",
				block.unique_addresses as f64,
			),
			(
				&series.value_transferred_wei,
				"monad_total_value_transferred_wei",
				block.value_transferred_wei,
			),
			(
				&series.avg_gas_price_wei,
				"monad_avg_gas_price_per_block_wei",
				block.avg_gas_price_wei,
			),
			(
				&series.max_gas_price_wei,
				"monad_max_gas_price_per_block_wei",
				block.max_gas_price_wei,
			),
			(
				&series.min_gas_price_wei,
				"monad_min_gas_price_per_block_wei",
				block.min_gas_price_wei,
			),
		];

		for (gauge, name, value) in values {
			set_labeled(gauge, name, &by_block, value)?;
		}

		for (kind, count) in &block.transaction_kinds {
			set_labeled(
				&series.transaction_types,
				"monad_transaction_types",
				&[kind.label(), number.as_str()],
				*count as f64,
			)?;
		}

		Ok(())
	}
}

#[async_trait]
impl MetricsSink for PrometheusSink {
	async fn publish(&self, snapshot: ChainSnapshot) -> Result<Arc<ChainSnapshot>, SinkError> {
		let published = self.store.replace(snapshot).await;
		self.project(&published)?;
		Ok(published)
	}

	fn record_cycle(&self, result: &CycleResult, duration: Duration) {
		self.metrics
			.collection_cycles_total
			.with_label_values(&[result.label()])
			.inc();
		self.metrics
			.collection_time_seconds
			.set(duration.as_secs_f64());
	}

	async fn latest(&self) -> Arc<ChainSnapshot> {
		self.store.latest().await
	}
}
