//! Failures that abort a whole collection cycle.

use crate::{
	services::blockchain::RpcError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// A cycle-fatal failure; nothing is published when one is returned
#[derive(ThisError, Debug)]
pub enum AggregatorError {
	/// The chain head could not be resolved
	#[error("Head block unavailable: {0}")]
	HeadUnavailable(ErrorContext),

	/// The current gas price could not be read
	#[error("Gas price unavailable: {0}")]
	GasPriceUnavailable(ErrorContext),
}

impl AggregatorError {
	pub fn head_unavailable(source: RpcError, metadata: Option<HashMap<String, String>>) -> Self {
		Self::HeadUnavailable(ErrorContext::new(
			"failed to resolve the head block number",
			Some(Box::new(source)),
			metadata,
		))
	}

	pub fn gas_price_unavailable(
		source: RpcError,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::GasPriceUnavailable(ErrorContext::new(
			"failed to read the gas price",
			Some(Box::new(source)),
			metadata,
		))
	}

	/// The RPC failure behind this error.
	pub fn rpc_error(&self) -> Option<&RpcError> {
		let context = match self {
			Self::HeadUnavailable(ctx) | Self::GasPriceUnavailable(ctx) => ctx,
		};
		context
			.source
			.as_ref()
			.and_then(|source| source.downcast_ref::<RpcError>())
	}
}

impl TraceableError for AggregatorError {
	fn trace_id(&self) -> String {
		match self {
			Self::HeadUnavailable(ctx) | Self::GasPriceUnavailable(ctx) => ctx.trace_id.clone(),
		}
	}
}
