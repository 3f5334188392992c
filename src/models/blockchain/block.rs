//! Block data structures.

use serde::{Deserialize, Serialize};

use crate::utils::hex::{decode_optional_quantity, Quantity};

use super::Transaction;

/// Entry of a block's `transactions` array.
///
/// Blocks fetched with full transactions carry objects; blocks fetched without
/// them carry bare hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransaction {
	/// Full transaction body
	///
	/// # Note
	/// Box is used here to equalize the enum variants
	Full(Box<Transaction>),
	/// Transaction hash only
	Hash(String),
}

impl BlockTransaction {
	/// The transaction body, when the block was fetched with full transactions.
	pub fn as_full(&self) -> Option<&Transaction> {
		match self {
			BlockTransaction::Full(tx) => Some(tx),
			BlockTransaction::Hash(_) => None,
		}
	}
}

/// A block as returned by `eth_getBlockByNumber`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
	/// Block number
	#[serde(default)]
	pub number: Option<String>,
	/// Hash of the block
	#[serde(default)]
	pub hash: Option<String>,
	/// Hash of the parent
	#[serde(rename = "parentHash", default)]
	pub parent_hash: Option<String>,
	/// Unix timestamp in seconds
	#[serde(default)]
	pub timestamp: Option<String>,
	/// Gas Used
	#[serde(rename = "gasUsed", default)]
	pub gas_used: Option<String>,
	/// Gas Limit
	#[serde(rename = "gasLimit", default)]
	pub gas_limit: Option<String>,
	/// Size in bytes
	#[serde(default)]
	pub size: Option<String>,
	/// Base fee per unit of gas
	#[serde(rename = "baseFeePerGas", default)]
	pub base_fee_per_gas: Option<String>,
	/// Transactions, either full bodies or hashes
	#[serde(default)]
	pub transactions: Vec<BlockTransaction>,
}

impl Block {
	pub fn number(&self) -> Quantity {
		decode_optional_quantity(self.number.as_deref())
	}

	pub fn timestamp(&self) -> Quantity {
		decode_optional_quantity(self.timestamp.as_deref())
	}

	pub fn gas_used(&self) -> Quantity {
		decode_optional_quantity(self.gas_used.as_deref())
	}

	pub fn gas_limit(&self) -> Quantity {
		decode_optional_quantity(self.gas_limit.as_deref())
	}

	pub fn size(&self) -> Quantity {
		decode_optional_quantity(self.size.as_deref())
	}

	pub fn base_fee_per_gas(&self) -> Quantity {
		decode_optional_quantity(self.base_fee_per_gas.as_deref())
	}

	/// Number of entries in `transactions`, whether full or hash-only.
	pub fn transaction_count(&self) -> usize {
		self.transactions.len()
	}

	/// Iterates over full transaction bodies, skipping hash-only entries.
	pub fn full_transactions(&self) -> impl Iterator<Item = &Transaction> {
		self.transactions.iter().filter_map(BlockTransaction::as_full)
	}
}
