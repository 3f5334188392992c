use mockall::mock;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use monad_exporter::services::blockchain::{
	BlockchainTransport, RotatingTransport, TransportError,
};

// Mock transport answering JSON-RPC calls from per-test expectations.
// `send_raw_request` receives the positional params as a plain vector.
mock! {
	pub RpcTransport {
		pub async fn send_raw_request(
			&self,
			method: &str,
			params: Option<Vec<Value>>,
		) -> Result<Value, TransportError>;
		pub async fn get_current_url(&self) -> String;
	}

	impl Clone for RpcTransport {
		fn clone(&self) -> Self;
	}
}

#[async_trait::async_trait]
impl BlockchainTransport for MockRpcTransport {
	async fn get_current_url(&self) -> String {
		self.get_current_url().await
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let params_value = params.map(|p| p.into());
		self.send_raw_request(method, params_value.and_then(|v| v.as_array().cloned()))
			.await
	}}

#[async_trait::async_trait]
impl RotatingTransport for MockRpcTransport {
	async fn try_connect(&self, _url: &str) -> Result<(), anyhow::Error> {
		Ok(())
	}

	async fn update_client(&self, _url: &str) -> Result<(), anyhow::Error> {
		Ok(())
	}
}

/// Wraps a result in a JSON-RPC 2.0 success envelope
pub fn rpc_result(result: Value) -> Value {
	json!({"jsonrpc": "2.0", "id": 1, "result": result})
}

/// Wraps a code and message in a JSON-RPC 2.0 error envelope
pub fn rpc_error(code: i64, message: &str) -> Value {
	json!({"jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}})
}

// Transport whose client update always fails, used to exercise rotation errors.
#[derive(Clone)]
pub struct AlwaysFailsToUpdateClientTransport {
	pub current_url: Arc<RwLock<String>>,
}

#[async_trait::async_trait]
impl BlockchainTransport for AlwaysFailsToUpdateClientTransport {
	async fn get_current_url(&self) -> String {
		self.current_url.read().await.clone()
	}

	async fn send_raw_request<P: Into<Value> + Send + Clone + Serialize>(
		&self,
		_method: &str,
		_params: Option<P>,
	) -> Result<Value, TransportError> {
		Ok(rpc_result(json!("mocked_response")))
	}}

#[async_trait::async_trait]
impl RotatingTransport for AlwaysFailsToUpdateClientTransport {
	async fn try_connect(&self, _url: &str) -> Result<(), anyhow::Error> {
		Ok(())
	}

	async fn update_client(&self, _url: &str) -> Result<(), anyhow::Error> {
		Err(anyhow::anyhow!("Simulated client update failure"))
	}
}

// Transport for endpoint manager tests: probes with a real GET and records the
// URL it was switched to.
#[derive(Clone)]
pub struct MockTransport {
	client: reqwest::Client,
	current_url: Arc<RwLock<String>>,
}

impl MockTransport {
	pub fn new() -> Self {
		Self {
			client: reqwest::Client::new(),
			current_url: Arc::new(RwLock::new(String::new())),
		}
	}
}

#[async_trait::async_trait]
impl BlockchainTransport for MockTransport {
	async fn get_current_url(&self) -> String {
		self.current_url.read().await.clone()
	}

	async fn send_raw_request<P: Into<Value> + Send + Clone + Serialize>(
		&self,
		_method: &str,
		_params: Option<P>,
	) -> Result<Value, TransportError> {
		Ok(rpc_result(json!("mocked_response")))
	}}

#[async_trait::async_trait]
impl RotatingTransport for MockTransport {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		match self.client.get(url).send().await {
			Ok(_) => Ok(()),
			Err(e) => Err(anyhow::anyhow!("Failed to connect: {}", e)),
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		*self.current_url.write().await = url.to_string();
		Ok(())
	}
}
