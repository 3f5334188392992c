//! reqwest-based JSON-RPC transport.
//!
//! Endpoints are taken from the exporter configuration in descending weight order. The
//! first one that answers the probe becomes active and the rest become fallbacks. When
//! none answers, the highest-weight endpoint is used anyway so the exporter keeps
//! serving its last values and retries on the next cycle.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::{
	models::ExporterConfig,
	services::blockchain::transports::{
		redact_url, BlockchainTransport, EndpointManager, RotatingTransport,
		TransientErrorRetryStrategy, TransportError,
	},
	utils::http::create_retryable_http_client,
};

/// JSON-RPC client over HTTP with endpoint failover
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Client shared with the endpoint manager
	pub client: ClientWithMiddleware,
	endpoint_manager: EndpointManager,
	/// Probe request body; `eth_blockNumber` when `None`
	test_connection_payload: Option<String>,
}

fn probe_request(test_connection_payload: &Option<String>) -> Result<Value, anyhow::Error> {
	match test_connection_payload {
		Some(payload) => {
			serde_json::from_str(payload).context("Failed to parse test payload as JSON")
		}
		None => Ok(json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": "eth_blockNumber",
			"params": []
		})),
	}
}

async fn probe(
	client: &ClientWithMiddleware,
	url: &str,
	request: &Value,
) -> Result<(), anyhow::Error> {
	let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", redact_url(url)))?;

	let response = client
		.post(parsed)
		.json(request)
		.send()
		.await
		.map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", redact_url(url), e))?;

	let status = response.status();
	if status.is_success() {
		Ok(())
	} else {
		Err(anyhow::anyhow!(
			"Failed to connect to {}: {}",
			redact_url(url),
			status.as_u16()
		))
	}
}

impl HttpTransportClient {
	/// Builds the transport and picks the active endpoint.
	///
	/// # Arguments
	/// * `config` - Exporter configuration with resolved RPC URLs, timeout and retry policy
	/// * `test_connection_payload` - Optional JSON-RPC body used to probe endpoints
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - Fails only when no endpoint is enabled or the
	///   HTTP client cannot be built
	pub async fn new(
		config: &ExporterConfig,
		test_connection_payload: Option<String>,
	) -> Result<Self, anyhow::Error> {
		let mut rpc_urls: Vec<(String, u32)> = config
			.rpc_urls
			.iter()
			.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
			.map(|rpc_url| (rpc_url.url.as_str().to_string(), rpc_url.weight))
			.collect();
		rpc_urls.sort_by(|a, b| b.1.cmp(&a.1));

		let urls: Vec<String> = rpc_urls.into_iter().map(|(url, _)| url).collect();
		let Some(highest_weight) = urls.first().cloned() else {
			return Err(anyhow::anyhow!("No enabled RPC URLs configured"));
		};

		let timeout = config.rpc_timeout();
		let base_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(8)
			.timeout(timeout)
			.connect_timeout(timeout.min(Duration::from_secs(10)))
			.build()
			.context("Failed to create base HTTP client")?;

		let client = create_retryable_http_client(
			&config.rpc_retry,
			base_client,
			Some(TransientErrorRetryStrategy),
		);

		let request = probe_request(&test_connection_payload)?;

		let mut active = None;
		for url in &urls {
			match probe(&client, url, &request).await {
				Ok(()) => {
					active = Some(url.clone());
					break;
				}
				Err(e) => tracing::debug!(error = %e, "RPC endpoint probe failed"),
			}
		}

		let active = match active {
			Some(url) => url,
			None => {
				tracing::warn!(
					url = %redact_url(&highest_weight),
					"No RPC endpoint answered the startup probe, using the highest-weight URL"
				);
				highest_weight
			}
		};

		let fallback_urls: Vec<String> = urls.into_iter().filter(|url| *url != active).collect();

		tracing::info!(
			url = %redact_url(&active),
			fallbacks = fallback_urls.len(),
			"RPC transport ready"
		);

		Ok(Self {
			endpoint_manager: EndpointManager::new(client.clone(), &active, fallback_urls),
			client,
			test_connection_payload,
		})
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	/// Sends a JSON-RPC request through the endpoint manager
	///
	/// # Arguments
	/// * `method` - The JSON-RPC method name
	/// * `params` - Optional parameters; sent as `[]` when absent
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - The raw response envelope
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}}

#[async_trait]
impl RotatingTransport for HttpTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		let request = probe_request(&self.test_connection_payload)?;
		probe(&self.client, url, &request).await
	}

	/// Makes `url` the active endpoint, keeping it byte-for-byte so it still matches
	/// its entry in the fallback list
	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", redact_url(url)))?;
		let mut active_url = self.endpoint_manager.active_url.write().await;
		*active_url = url.to_string();
		Ok(())
	}
}
