//! Ledger data structures returned by the JSON-RPC node.
//!
//! Numeric fields are kept as the raw hex strings the node sent and decoded on
//! demand through [`crate::utils::hex`], so a malformed value never makes a block
//! fail to deserialize on its own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::hex::encode_u64;

mod block;
mod transaction;

pub use block::{Block, BlockTransaction};
pub use transaction::{Transaction, TransactionKind};

/// Block selector accepted by `eth_getBlockByNumber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
	/// A specific block height
	Number(u64),
	/// The chain head as seen by the node
	Latest,
}

impl BlockTag {
	/// Wire form: minimal hex for numbers, `"latest"` for the head.
	pub fn as_param(&self) -> String {
		match self {
			BlockTag::Number(n) => encode_u64(*n),
			BlockTag::Latest => "latest".to_string(),
		}
	}
}

impl fmt::Display for BlockTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BlockTag::Number(n) => write!(f, "{}", n),
			BlockTag::Latest => f.write_str("latest"),
		}
	}
}

impl From<u64> for BlockTag {
	fn from(number: u64) -> Self {
		BlockTag::Number(number)
	}
}

impl Serialize for BlockTag {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.as_param())
	}
}

impl<'de> Deserialize<'de> for BlockTag {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		if raw.eq_ignore_ascii_case("latest") {
			return Ok(BlockTag::Latest);
		}
		let quantity = crate::utils::hex::decode_quantity(&raw);
		if quantity.defaulted {
			return Err(serde::de::Error::custom(format!(
				"invalid block tag: {}",
				raw
			)));
		}
		Ok(BlockTag::Number(quantity.to_u64()))
	}
}
