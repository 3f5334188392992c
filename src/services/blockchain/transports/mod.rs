//! JSON-RPC transport over HTTP.
//!
//! - [`HttpTransportClient`]: reqwest-based client with a startup probe and failover
//! - [`EndpointManager`]: active/fallback URL bookkeeping and rotation
//! - [`TransportError`]: failures below the JSON-RPC envelope

mod endpoint_manager;
mod error;
mod http;

pub use endpoint_manager::EndpointManager;
pub use error::TransportError;
pub use http::HttpTransportClient;

use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde::Serialize;
use serde_json::{json, Value};

/// HTTP status codes that trigger RPC endpoint rotation
/// - 429: Too Many Requests - indicates rate limiting from the current endpoint
pub const ROTATE_ON_ERROR_CODES: [u16; 1] = [429];

/// Strips the query string from a URL so API keys passed as query parameters stay
/// out of logs and error messages.
pub fn redact_url(url: &str) -> String {
	match url.split_once('?') {
		Some((base, _)) => format!("{}?<redacted>", base),
		None => url.to_string(),
	}
}

/// Base trait for JSON-RPC transports
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the current URL being used by the transport
	async fn get_current_url(&self) -> String;

	/// Sends one JSON-RPC request and returns the raw response envelope
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Builds the JSON-RPC 2.0 envelope; absent params are sent as an empty array
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into()).unwrap_or_else(|| json!([]))
		})
	}
}

/// Extension trait for transports that support URL rotation
#[async_trait::async_trait]
pub trait RotatingTransport: BlockchainTransport {
	/// Checks that `url` answers before it becomes the active endpoint
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error>;

	/// Makes `url` the active endpoint
	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error>;
}

/// Retry strategy deferring to reqwest-retry's transient-error classification
/// (5xx, 408, 429 and connection failures are retried).
///
/// Only consulted when `rpc_retry.max_retries` is above zero.
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}
