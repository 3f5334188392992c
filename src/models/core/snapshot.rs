//! The externally published chain state.
//!
//! A [`ChainSnapshot`] is built whole by the aggregator from the previous one and
//! replaced as a unit. Fields that a cycle could not refresh keep their previous values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::TransactionKind;

/// Values identifying the chain and node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
	/// Decimal chain id
	pub chain_id: String,
	pub client_version: String,
	pub network: String,
}

/// Point samples of the head block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentBlock {
	pub gas_used: f64,
	pub gas_limit: f64,
	/// Only refreshed when the gas limit is non-zero
	pub gas_utilization_percent: f64,
	pub size_bytes: f64,
	pub transaction_count: u64,
	pub base_fee_per_gas_wei: f64,
	pub timestamp: u64,
}

/// Per-block figures, published as block-number labeled series when enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockBreakdown {
	pub number: u64,
	pub gas_used: f64,
	pub gas_limit: f64,
	pub gas_utilization_percent: f64,
	pub size_bytes: f64,
	pub transaction_count: u64,
	pub transaction_kinds: BTreeMap<TransactionKind, u64>,
	pub contract_calls: u64,
	pub simple_transfers: u64,
	pub unique_addresses: u64,
	pub value_transferred_wei: f64,
	pub avg_gas_price_wei: f64,
	pub max_gas_price_wei: f64,
	pub min_gas_price_wei: f64,
}

/// Everything the exporter publishes, as of the last successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
	pub chain: ChainInfo,

	pub block_number: u64,
	pub gas_price_wei: f64,
	pub gas_price_gwei: f64,
	pub max_priority_fee_per_gas_wei: f64,

	pub current_block: CurrentBlock,

	pub avg_block_time_seconds: f64,
	pub transactions_per_second: f64,
	pub avg_transactions_per_block: f64,
	pub avg_gas_utilization_percent: f64,
	pub avg_gas_price_wei: f64,
	pub avg_unique_addresses_per_block: f64,

	/// Window counts for every kind, including kinds not seen
	pub transaction_kinds: BTreeMap<TransactionKind, u64>,
	pub contract_calls: u64,
	pub simple_transfers: u64,
	pub total_value_transferred_wei: f64,

	/// Blocks actually folded into the window aggregates
	pub window_blocks_fetched: u64,
	/// Malformed quantities decoded as zero during the cycle
	pub decode_defaulted_quantities: u64,

	/// Per-block breakdown of the folded window, newest first
	pub blocks: Vec<BlockBreakdown>,

	/// RFC 3339 time the snapshot was produced; empty before the first cycle
	pub updated_at: String,
}

impl ChainSnapshot {
	/// True until a cycle has published.
	pub fn is_empty(&self) -> bool {
		self.updated_at.is_empty()
	}
}
