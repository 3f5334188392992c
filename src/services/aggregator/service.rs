//! One collection cycle over the trailing block window.
//!
//! The cycle reads chain id, client version, head, gas price and priority fee, folds
//! the window blocks one at a time, then derives block time and throughput from the
//! oldest and newest window timestamps. Only the head and the gas price are fatal;
//! every other failure becomes a [`CycleIssue`] and the affected values keep what the
//! previous snapshot held.

use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
	models::{BlockTag, ChainSnapshot, ExporterConfig},
	services::{
		aggregator::{
			error::AggregatorError,
			window::{average_block_time, transactions_per_second, utilization_percent, WindowStats},
		},
		blockchain::{BlockFetcher, RpcError},
	},
	utils::hex::{u256_to_f64, Quantity},
};

const WEI_PER_GWEI: f64 = 1e9;

/// Settings for [`WindowAggregator`]
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
	/// Label published on `monad_chain_info`
	pub network: String,
	/// Trailing blocks analyzed per cycle, at least 1
	pub window_size: u64,
	/// Pause before every window fetch except the first
	pub fetch_delay: Duration,
	/// Extra pause after a rate-limited window fetch
	pub rate_limit_backoff: Duration,
	/// Keep per-block breakdowns in the snapshot
	pub per_block_series: bool,
}

impl Default for AggregatorConfig {
	fn default() -> Self {
		Self::from(&ExporterConfig::default())
	}
}

impl From<&ExporterConfig> for AggregatorConfig {
	fn from(config: &ExporterConfig) -> Self {
		Self {
			network: config.network.clone(),
			window_size: config.window_size.max(1),
			fetch_delay: config.fetch_delay(),
			rate_limit_backoff: config.rate_limit_backoff(),
			per_block_series: config.per_block_series,
		}
	}
}

/// A non-fatal problem met during a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleIssue {
	ChainIdUnavailable(String),
	ClientVersionUnavailable(String),
	PriorityFeeUnavailable(String),
	/// A window block could not be fetched or decoded and was left out of the fold
	BlockSkipped {
		number: u64,
		rate_limited: bool,
		reason: String,
	},
	/// The head block was skipped, so the current-block samples are stale
	CurrentBlockUnavailable,
	/// Block time and throughput were not refreshed
	BlockTimeUnavailable(String),
}

impl fmt::Display for CycleIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ChainIdUnavailable(reason) => write!(f, "chain id unavailable: {}", reason),
			Self::ClientVersionUnavailable(reason) => {
				write!(f, "client version unavailable: {}", reason)
			}
			Self::PriorityFeeUnavailable(reason) => {
				write!(f, "max priority fee unavailable: {}", reason)
			}
			Self::BlockSkipped {
				number,
				rate_limited,
				reason,
			} => {
				if *rate_limited {
					write!(f, "block {} skipped (rate limited): {}", number, reason)
				} else {
					write!(f, "block {} skipped: {}", number, reason)
				}
			}
			Self::CurrentBlockUnavailable => f.write_str("current block unavailable"),
			Self::BlockTimeUnavailable(reason) => write!(f, "block time unavailable: {}", reason),
		}
	}
}

/// Outcome of a cycle that reached the publish step
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
	pub snapshot: ChainSnapshot,
	/// Empty for a clean cycle
	pub issues: Vec<CycleIssue>,
}

impl CycleReport {
	pub fn is_partial(&self) -> bool {
		!self.issues.is_empty()
	}
}

#[async_trait]
pub trait WindowAggregatorTrait: Send + Sync {
	/// Runs one cycle and builds the next snapshot from `previous`.
	///
	/// # Arguments
	/// * `previous` - Last published snapshot, source of every value this cycle could
	///   not refresh
	///
	/// # Returns
	/// * `Result<CycleReport, AggregatorError>` - The new snapshot and its issues, or the
	///   fatal failure that aborted the cycle
	async fn collect(&self, previous: &ChainSnapshot) -> Result<CycleReport, AggregatorError>;
}

/// Window aggregator backed by a [`BlockFetcher`]
pub struct WindowAggregator<F> {
	fetcher: Arc<F>,
	config: AggregatorConfig,
}

impl<F: BlockFetcher> WindowAggregator<F> {
	pub fn new(fetcher: Arc<F>, config: AggregatorConfig) -> Self {
		Self { fetcher, config }
	}

	/// Heights of the window, newest first, stopping at genesis.
	pub fn window_blocks(&self, head: u64) -> Vec<u64> {
		let count = self.config.window_size.max(1).min(head.saturating_add(1));
		(0..count).map(|offset| head - offset).collect()
	}

	async fn pause(duration: Duration) {
		if !duration.is_zero() {
			tokio::time::sleep(duration).await;
		}
	}

	async fn block_time(
		&self,
		oldest: u64,
		head: u64,
		defaulted: &mut u64,
	) -> Result<Option<f64>, RpcError> {
		let oldest_block = self.fetcher.get_block(BlockTag::Number(oldest), false).await?;
		let head_block = self.fetcher.get_block(BlockTag::Number(head), false).await?;

		let mut timestamp = |quantity: Quantity| {
			if quantity.defaulted {
				*defaulted += 1;
			}
			quantity.to_u64()
		};
		let oldest_timestamp = timestamp(oldest_block.timestamp());
		let head_timestamp = timestamp(head_block.timestamp());

		Ok(average_block_time(
			oldest_timestamp,
			head_timestamp,
			head - oldest,
		))
	}
}

fn count_defaulted(quantity: &Quantity, defaulted: &mut u64) {
	if quantity.defaulted {
		*defaulted += 1;
	}
}

#[async_trait]
impl<F: BlockFetcher> WindowAggregatorTrait for WindowAggregator<F> {
	#[instrument(skip_all, fields(network = %self.config.network, window = self.config.window_size))]
	async fn collect(&self, previous: &ChainSnapshot) -> Result<CycleReport, AggregatorError> {
		let mut snapshot = previous.clone();
		let mut issues = Vec::new();
		let mut defaulted = 0u64;

		snapshot.chain.network = self.config.network.clone();

		match self.fetcher.get_chain_id().await {
			Ok(chain_id) => {
				count_defaulted(&chain_id, &mut defaulted);
				snapshot.chain.chain_id = chain_id.value.to_string();
			}
			Err(e) => issues.push(CycleIssue::ChainIdUnavailable(e.to_string())),
		}

		match self.fetcher.get_client_version().await {
			Ok(version) => snapshot.chain.client_version = version,
			Err(e) => issues.push(CycleIssue::ClientVersionUnavailable(e.to_string())),
		}

		let head = self
			.fetcher
			.get_block_number()
			.await
			.map_err(|e| AggregatorError::head_unavailable(e, None))?;
		count_defaulted(&head, &mut defaulted);
		let head = head.to_u64();

		let metadata = Some(HashMap::from([("head".to_string(), head.to_string())]));
		let gas_price = self
			.fetcher
			.get_gas_price()
			.await
			.map_err(|e| AggregatorError::gas_price_unavailable(e, metadata))?;
		count_defaulted(&gas_price, &mut defaulted);

		snapshot.block_number = head;
		snapshot.gas_price_wei = gas_price.to_f64();
		snapshot.gas_price_gwei = gas_price.to_f64() / WEI_PER_GWEI;

		match self.fetcher.get_max_priority_fee_per_gas().await {
			Ok(fee) => {
				count_defaulted(&fee, &mut defaulted);
				snapshot.max_priority_fee_per_gas_wei = fee.to_f64();
			}
			Err(e) => issues.push(CycleIssue::PriorityFeeUnavailable(e.to_string())),
		}

		let window = self.window_blocks(head);
		let mut stats = WindowStats::new();
		let mut breakdowns = Vec::with_capacity(window.len());

		for (index, number) in window.iter().copied().enumerate() {
			if index > 0 {
				Self::pause(self.config.fetch_delay).await;
			}

			let block = match self.fetcher.get_block(BlockTag::Number(number), true).await {
				Ok(block) => block,
				Err(e) => {
					let rate_limited = e.is_rate_limited();
					tracing::warn!(block = number, rate_limited, error = %e, "Skipping window block");
					issues.push(CycleIssue::BlockSkipped {
						number,
						rate_limited,
						reason: e.to_string(),
					});
					if index == 0 {
						issues.push(CycleIssue::CurrentBlockUnavailable);
					}
					if rate_limited {
						Self::pause(self.config.rate_limit_backoff).await;
					}
					continue;
				}
			};

			let breakdown = stats.fold_block(number, &block);

			if index == 0 {
				let base_fee = block.base_fee_per_gas();
				let timestamp = block.timestamp();
				count_defaulted(&base_fee, &mut defaulted);
				count_defaulted(&timestamp, &mut defaulted);

				let current = &mut snapshot.current_block;
				current.gas_used = breakdown.gas_used;
				current.gas_limit = breakdown.gas_limit;
				if let Some(percent) = utilization_percent(breakdown.gas_used, breakdown.gas_limit) {
					current.gas_utilization_percent = percent;
				}
				current.size_bytes = breakdown.size_bytes;
				current.transaction_count = breakdown.transaction_count;
				current.base_fee_per_gas_wei = base_fee.to_f64();
				current.timestamp = timestamp.to_u64();
			}

			breakdowns.push(breakdown);
		}

		let summary = stats.summarize(self.config.window_size);
		snapshot.avg_transactions_per_block = summary.avg_transactions_per_block;
		snapshot.avg_unique_addresses_per_block = summary.avg_unique_addresses_per_block;
		if let Some(percent) = summary.avg_gas_utilization_percent {
			snapshot.avg_gas_utilization_percent = percent;
		}
		if let Some(price) = summary.avg_gas_price_wei {
			snapshot.avg_gas_price_wei = price;
		}
		snapshot.transaction_kinds = stats.transaction_kinds.clone();
		snapshot.contract_calls = stats.contract_calls;
		snapshot.simple_transfers = stats.simple_transfers;
		snapshot.total_value_transferred_wei = u256_to_f64(stats.total_value);
		snapshot.window_blocks_fetched = stats.blocks_folded;
		snapshot.blocks = if self.config.per_block_series {
			breakdowns
		} else {
			Vec::new()
		};

		if let Some(oldest) = window.last().copied().filter(|oldest| *oldest < head) {
			match self.block_time(oldest, head, &mut defaulted).await {
				Ok(Some(block_time)) => {
					snapshot.avg_block_time_seconds = block_time;
					if let Some(tps) =
						transactions_per_second(summary.avg_transactions_per_block, block_time)
					{
						snapshot.transactions_per_second = tps;
					}
				}
				Ok(None) => {
					tracing::debug!(oldest, head, "Head timestamp not after oldest, block time kept");
				}
				Err(e) => issues.push(CycleIssue::BlockTimeUnavailable(e.to_string())),
			}
		}

		snapshot.decode_defaulted_quantities = defaulted + stats.defaulted_quantities;
		snapshot.updated_at = Utc::now().to_rfc3339();

		Ok(CycleReport { snapshot, issues })
	}
}
