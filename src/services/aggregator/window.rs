//! Window fold and the figures derived from it.
//!
//! [`WindowStats`] accumulates every block folded during one cycle. Averages per block
//! always divide by the configured window size, so a skipped block lowers them instead
//! of failing the cycle. Averages over gas limit and gas prices are `None` when their
//! denominator is zero, which leaves the previous published value in place.

use alloy::primitives::U256;
use std::collections::{BTreeMap, HashSet};

use crate::{
	models::{BlockBreakdown, Block, TransactionKind},
	utils::hex::{u256_to_f64, Quantity},
};

/// Accumulator for one collection cycle
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
	pub blocks_folded: u64,
	pub total_transactions: u64,
	pub total_gas_used: u128,
	pub total_gas_limit: u128,
	/// Always holds all four kinds
	pub transaction_kinds: BTreeMap<TransactionKind, u64>,
	pub contract_calls: u64,
	pub simple_transfers: u64,
	/// Sum over blocks of the distinct addresses seen in each block
	pub unique_addresses: u64,
	pub total_value: U256,
	pub gas_price_sum: U256,
	pub gas_price_count: u64,
	/// Malformed quantities met while folding
	pub defaulted_quantities: u64,
}

/// Figures derived from a finished [`WindowStats`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSummary {
	pub avg_transactions_per_block: f64,
	/// `None` when no gas limit was accumulated
	pub avg_gas_utilization_percent: Option<f64>,
	/// `None` when no transaction was folded
	pub avg_gas_price_wei: Option<f64>,
	pub avg_unique_addresses_per_block: f64,
}

impl Default for WindowStats {
	fn default() -> Self {
		Self {
			blocks_folded: 0,
			total_transactions: 0,
			total_gas_used: 0,
			total_gas_limit: 0,
			transaction_kinds: zeroed_kinds(),
			contract_calls: 0,
			simple_transfers: 0,
			unique_addresses: 0,
			total_value: U256::ZERO,
			gas_price_sum: U256::ZERO,
			gas_price_count: 0,
			defaulted_quantities: 0,
		}
	}
}

/// A kind-to-count map with every kind present at zero.
pub fn zeroed_kinds() -> BTreeMap<TransactionKind, u64> {
	TransactionKind::ALL.iter().map(|kind| (*kind, 0)).collect()
}

/// Gas utilization in percent, `None` for a zero limit.
pub fn utilization_percent(gas_used: f64, gas_limit: f64) -> Option<f64> {
	if gas_limit > 0.0 {
		Some(gas_used / gas_limit * 100.0)
	} else {
		None
	}
}

/// Average seconds per block between two timestamps `intervals` blocks apart.
///
/// # Returns
/// * `Option<f64>` - `None` unless `head_timestamp` is strictly later than
///   `oldest_timestamp` and `intervals` is non-zero
pub fn average_block_time(oldest_timestamp: u64, head_timestamp: u64, intervals: u64) -> Option<f64> {
	if head_timestamp <= oldest_timestamp || intervals == 0 {
		return None;
	}
	Some((head_timestamp - oldest_timestamp) as f64 / intervals as f64)
}

/// Transactions per second, `None` unless the block time is positive.
pub fn transactions_per_second(avg_transactions_per_block: f64, avg_block_time: f64) -> Option<f64> {
	if avg_block_time > 0.0 {
		Some(avg_transactions_per_block / avg_block_time)
	} else {
		None
	}
}

impl WindowStats {
	pub fn new() -> Self {
		Self::default()
	}

	fn track(&mut self, quantity: Quantity) -> Quantity {
		if quantity.defaulted {
			self.defaulted_quantities += 1;
		}
		quantity
	}

	/// Folds one block into the window and returns its own breakdown.
	///
	/// Entries of `transactions` that are bare hashes are counted in the block's
	/// transaction total but cannot be classified.
	///
	/// # Arguments
	/// * `number` - Height the block was requested at; labels the breakdown whatever
	///   the block's own `number` field holds
	/// * `block` - The fetched block
	pub fn fold_block(&mut self, number: u64, block: &Block) -> BlockBreakdown {
		let gas_used = self.track(block.gas_used());
		let gas_limit = self.track(block.gas_limit());
		let size = self.track(block.size());
		let transaction_count = block.transaction_count() as u64;

		let mut breakdown = BlockBreakdown {
			number,
			gas_used: gas_used.to_f64(),
			gas_limit: gas_limit.to_f64(),
			gas_utilization_percent: utilization_percent(gas_used.to_f64(), gas_limit.to_f64())
				.unwrap_or(0.0),
			size_bytes: size.to_f64(),
			transaction_count,
			transaction_kinds: zeroed_kinds(),
			..BlockBreakdown::default()
		};

		let mut addresses = HashSet::new();
		let mut block_value = U256::ZERO;
		let mut price_sum = U256::ZERO;
		let mut price_count = 0u64;
		let mut min_price: Option<U256> = None;
		let mut max_price = U256::ZERO;

		for tx in block.full_transactions() {
			let kind = tx.kind();
			*breakdown.transaction_kinds.entry(kind).or_insert(0) += 1;
			*self.transaction_kinds.entry(kind).or_insert(0) += 1;

			if tx.is_contract_call() {
				breakdown.contract_calls += 1;
			} else {
				breakdown.simple_transfers += 1;
			}

			let value = self.track(tx.value());
			block_value = block_value.saturating_add(value.value);

			let price = self.track(tx.effective_gas_price()).value;
			price_sum = price_sum.saturating_add(price);
			price_count += 1;
			max_price = max_price.max(price);
			min_price = Some(min_price.map_or(price, |min| min.min(price)));

			addresses.extend(tx.sender());
			addresses.extend(tx.recipient());
		}

		breakdown.unique_addresses = addresses.len() as u64;
		breakdown.value_transferred_wei = u256_to_f64(block_value);
		breakdown.max_gas_price_wei = u256_to_f64(max_price);
		breakdown.min_gas_price_wei = min_price.map(u256_to_f64).unwrap_or(0.0);
		if price_count > 0 {
			breakdown.avg_gas_price_wei = u256_to_f64(price_sum) / price_count as f64;
		}

		self.blocks_folded += 1;
		self.total_transactions += transaction_count;
		self.total_gas_used += u128::from(gas_used.to_u64());
		self.total_gas_limit += u128::from(gas_limit.to_u64());
		self.contract_calls += breakdown.contract_calls;
		self.simple_transfers += breakdown.simple_transfers;
		self.unique_addresses += breakdown.unique_addresses;
		self.total_value = self.total_value.saturating_add(block_value);
		self.gas_price_sum = self.gas_price_sum.saturating_add(price_sum);
		self.gas_price_count += price_count;

		breakdown
	}

	/// Derives the window averages.
	///
	/// # Arguments
	/// * `window_size` - Configured number of blocks; used as the per-block denominator
	///   whatever the number of blocks actually folded
	pub fn summarize(&self, window_size: u64) -> WindowSummary {
		let per_block = |total: u64| {
			if window_size == 0 {
				0.0
			} else {
				total as f64 / window_size as f64
			}
		};

		WindowSummary {
			avg_transactions_per_block: per_block(self.total_transactions),
			avg_gas_utilization_percent: utilization_percent(
				self.total_gas_used as f64,
				self.total_gas_limit as f64,
			),
			avg_gas_price_wei: (self.gas_price_count > 0)
				.then(|| u256_to_f64(self.gas_price_sum) / self.gas_price_count as f64),
			avg_unique_addresses_per_block: per_block(self.unique_addresses),
		}
	}
}
