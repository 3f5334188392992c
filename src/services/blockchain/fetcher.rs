//! Typed accessors for the ledger RPC methods the exporter reads.
//!
//! Numeric results go through the hex codec, so a malformed value decodes to zero with
//! its `defaulted` flag set instead of failing the call. A result of the wrong JSON
//! type, or a `null` block, is a decode error.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{Block, BlockTag},
	services::blockchain::{error::RpcError, rpc::RpcClient, transports::BlockchainTransport},
	utils::hex::{decode_quantity, Quantity},
};

/// Read access to the chain data needed by one collection cycle
#[async_trait]
pub trait BlockFetcher: Send + Sync {
	/// Current head height (`eth_blockNumber`)
	async fn get_block_number(&self) -> Result<Quantity, RpcError>;

	/// Retrieves one block
	///
	/// # Arguments
	/// * `tag` - Height or `latest`
	/// * `full_transactions` - Whether to include transaction bodies or only hashes
	///
	/// # Returns
	/// * `Result<Block, RpcError>` - The block, or `RpcError::Decode` when the node
	///   returned `null` or an object that is not a block
	async fn get_block(&self, tag: BlockTag, full_transactions: bool) -> Result<Block, RpcError>;

	/// Current gas price in wei (`eth_gasPrice`)
	async fn get_gas_price(&self) -> Result<Quantity, RpcError>;

	/// Suggested priority fee in wei (`eth_maxPriorityFeePerGas`)
	async fn get_max_priority_fee_per_gas(&self) -> Result<Quantity, RpcError>;

	async fn get_chain_id(&self) -> Result<Quantity, RpcError>;

	/// Node software version string (`web3_clientVersion`)
	async fn get_client_version(&self) -> Result<String, RpcError>;
}

/// [`BlockFetcher`] for EVM-compatible nodes
#[derive(Clone, Debug)]
pub struct EvmBlockFetcher<T> {
	rpc: RpcClient<T>,
}

impl<T: BlockchainTransport> EvmBlockFetcher<T> {
	pub fn new(rpc: RpcClient<T>) -> Self {
		Self { rpc }
	}

	async fn get_quantity(&self, method: &str) -> Result<Quantity, RpcError> {
		self.rpc
			.call_with(method, Vec::new(), |result| match result.as_str() {
				Some(raw) => {
					let quantity = decode_quantity(raw);
					if quantity.defaulted {
						tracing::warn!(method, value = raw, "Malformed quantity decoded as zero");
					}
					Ok(quantity)
				}
				None => Err(wrong_type(method, "a hex string", &result)),
			})
			.await
	}
}

fn wrong_type(method: &str, expected: &str, got: &Value) -> RpcError {
	RpcError::decode(
		format!("{} returned {} instead of {}", method, json_type(got), expected),
		None,
		Some(HashMap::from([("method".to_string(), method.to_string())])),
	)
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[async_trait]
impl<T: BlockchainTransport> BlockFetcher for EvmBlockFetcher<T> {
	#[instrument(skip(self))]
	async fn get_block_number(&self) -> Result<Quantity, RpcError> {
		self.get_quantity("eth_blockNumber").await
	}

	#[instrument(skip(self), fields(block = %tag))]
	async fn get_block(&self, tag: BlockTag, full_transactions: bool) -> Result<Block, RpcError> {
		const METHOD: &str = "eth_getBlockByNumber";

		self.rpc
			.call_with(
				METHOD,
				vec![json!(tag.as_param()), json!(full_transactions)],
				|result| decode_block(result, tag),
			)
			.await
	}

	#[instrument(skip(self))]
	async fn get_gas_price(&self) -> Result<Quantity, RpcError> {
		self.get_quantity("eth_gasPrice").await
	}

	#[instrument(skip(self))]
	async fn get_max_priority_fee_per_gas(&self) -> Result<Quantity, RpcError> {
		self.get_quantity("eth_maxPriorityFeePerGas").await
	}

	#[instrument(skip(self))]
	async fn get_chain_id(&self) -> Result<Quantity, RpcError> {
		self.get_quantity("eth_chainId").await
	}

	#[instrument(skip(self))]
	async fn get_client_version(&self) -> Result<String, RpcError> {
		const METHOD: &str = "web3_clientVersion";

		self.rpc
			.call_with(METHOD, Vec::new(), |result| match result {
				Value::String(version) => Ok(version),
				other => Err(wrong_type(METHOD, "a string", &other)),
			})
			.await
	}
}

/// Decodes an `eth_getBlockByNumber` result; `null` and non-objects are decode errors.
fn decode_block(result: Value, tag: BlockTag) -> Result<Block, RpcError> {
	const METHOD: &str = "eth_getBlockByNumber";

	if !result.is_object() {
		return Err(with_block(wrong_type(METHOD, "a block object", &result), tag));
	}

	serde_json::from_value(result).map_err(|e| {
		RpcError::decode(
			format!("failed to decode block {}: {}", tag, e),
			Some(Box::new(e)),
			Some(HashMap::from([
				("method".to_string(), METHOD.to_string()),
				("block".to_string(), tag.to_string()),
			])),
		)
	})
}

fn with_block(error: RpcError, tag: BlockTag) -> RpcError {
	match error {
		RpcError::Decode(context) => RpcError::Decode(context.with_metadata("block", tag.to_string())),
		other => other,
	}
}
