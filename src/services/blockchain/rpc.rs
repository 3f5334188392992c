//! Single-call JSON-RPC client.
//!
//! Wraps a [`BlockchainTransport`], unwraps the response envelope and keeps the live
//! RPC series up to date: one latency observation per call, one error increment per
//! failed call labeled by method.

use serde_json::Value;
use std::{collections::HashMap, time::Instant};

use crate::{
	services::blockchain::{
		error::{mentions_rate_limit, RpcError},
		transports::BlockchainTransport,
	},
	utils::metrics::RpcMetrics,
};

/// JSON-RPC client bound to one transport
#[derive(Clone, Debug)]
pub struct RpcClient<T> {
	transport: T,
	metrics: RpcMetrics,
}

impl<T: BlockchainTransport> RpcClient<T> {
	pub fn new(transport: T, metrics: RpcMetrics) -> Self {
		Self { transport, metrics }
	}

	/// Calls `method` with positional `params`.
	///
	/// # Arguments
	/// * `method` - JSON-RPC method name
	/// * `params` - Positional parameters, sent as a JSON array
	///
	/// # Returns
	/// * `Result<Value, RpcError>` - The envelope's `result`, which may be `null`
	pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
		self.call_with(method, params, Ok).await
	}

	/// Calls `method` and converts the envelope's `result` with `decode`.
	///
	/// A failure returned by `decode` is a failed call like any other and counts in the
	/// error series for `method`.
	///
	/// # Arguments
	/// * `method` - JSON-RPC method name
	/// * `params` - Positional parameters, sent as a JSON array
	/// * `decode` - Conversion of the raw `result`
	pub async fn call_with<R, F>(
		&self,
		method: &str,
		params: Vec<Value>,
		decode: F,
	) -> Result<R, RpcError>
	where
		F: FnOnce(Value) -> Result<R, RpcError> + Send,
		R: Send,
	{
		let started = Instant::now();
		let outcome = self
			.transport
			.send_raw_request(method, Some(Value::Array(params)))
			.await;
		self.metrics
			.response_time
			.observe(started.elapsed().as_secs_f64());

		let result = match outcome {
			Ok(envelope) => unwrap_envelope(method, envelope).and_then(decode),
			Err(e) => Err(RpcError::from_transport(method, e)),
		};

		if let Err(e) = &result {
			self.metrics.errors.with_label_values(&[method]).inc();
			tracing::debug!(method, kind = e.kind(), error = %e, "RPC call failed");
		}

		result
	}
}

/// Extracts `result` from a JSON-RPC 2.0 response envelope.
fn unwrap_envelope(method: &str, envelope: Value) -> Result<Value, RpcError> {
	let metadata = || Some(HashMap::from([("method".to_string(), method.to_string())]));

	let Value::Object(mut fields) = envelope else {
		return Err(RpcError::decode(
			format!("{} response is not a JSON object", method),
			None,
			metadata(),
		));
	};

	if let Some(error) = fields.remove("error").filter(|e| !e.is_null()) {
		let message = error
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| error.to_string());

		if mentions_rate_limit(&message) || mentions_rate_limit(&error.to_string()) {
			return Err(RpcError::rate_limited(message, None, metadata()));
		}

		let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
		return Err(RpcError::rpc(code, message, metadata()));
	}

	fields.remove("result").ok_or_else(|| {
		RpcError::decode(
			format!("{} response has no result field", method),
			None,
			metadata(),
		)
	})
}
