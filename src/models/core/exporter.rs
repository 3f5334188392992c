use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{models::SecretValue, utils::RetryConfig};

/// Public endpoint used when nothing else is configured.
pub const DEFAULT_RPC_URL: &str = "https://monad-testnet.drpc.org";

fn default_name() -> String {
	"monad-exporter".to_string()
}

fn default_network() -> String {
	"monad-testnet".to_string()
}

fn default_rpc_urls() -> Vec<RpcUrl> {
	vec![RpcUrl::new(DEFAULT_RPC_URL, 100)]
}

fn default_window_size() -> u64 {
	5
}

fn default_collection_interval_ms() -> u64 {
	60_000
}

fn default_fetch_delay_ms() -> u64 {
	100
}

fn default_rate_limit_backoff_ms() -> u64 {
	500
}

fn default_rpc_timeout_ms() -> u64 {
	30_000
}

/// Configuration for one exporter process.
///
/// Every field has a default, so an empty JSON object is a valid file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
	/// Human-readable name of this exporter instance
	#[serde(default = "default_name")]
	pub name: String,

	/// Network label published on `monad_chain_info`
	#[serde(default = "default_network")]
	pub network: String,

	/// RPC endpoints with their weights for failover
	#[serde(default = "default_rpc_urls")]
	pub rpc_urls: Vec<RpcUrl>,

	/// API key appended to every RPC URL as the `dkey` query parameter
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rpc_api_key: Option<SecretValue>,

	/// Number of trailing blocks analyzed per cycle
	#[serde(default = "default_window_size")]
	pub window_size: u64,

	/// Pause between the end of one cycle and the start of the next
	#[serde(default = "default_collection_interval_ms")]
	pub collection_interval_ms: u64,

	/// Pause before every window block fetch except the first
	#[serde(default = "default_fetch_delay_ms")]
	pub fetch_delay_ms: u64,

	/// Extra pause after a rate-limited block fetch
	#[serde(default = "default_rate_limit_backoff_ms")]
	pub rate_limit_backoff_ms: u64,

	/// Per-request timeout for RPC calls
	#[serde(default = "default_rpc_timeout_ms")]
	pub rpc_timeout_ms: u64,

	/// Publish block-number labeled series for every folded block
	#[serde(default)]
	pub per_block_series: bool,

	/// Transport-level retries, disabled by default
	#[serde(default)]
	pub rpc_retry: RetryConfig,
}

impl Default for ExporterConfig {
	fn default() -> Self {
		Self {
			name: default_name(),
			network: default_network(),
			rpc_urls: default_rpc_urls(),
			rpc_api_key: None,
			window_size: default_window_size(),
			collection_interval_ms: default_collection_interval_ms(),
			fetch_delay_ms: default_fetch_delay_ms(),
			rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
			rpc_timeout_ms: default_rpc_timeout_ms(),
			per_block_series: false,
			rpc_retry: RetryConfig::default(),
		}
	}
}

impl ExporterConfig {
	pub fn collection_interval(&self) -> Duration {
		Duration::from_millis(self.collection_interval_ms)
	}

	pub fn fetch_delay(&self) -> Duration {
		Duration::from_millis(self.fetch_delay_ms)
	}

	pub fn rate_limit_backoff(&self) -> Duration {
		Duration::from_millis(self.rate_limit_backoff_ms)
	}

	pub fn rpc_timeout(&self) -> Duration {
		Duration::from_millis(self.rpc_timeout_ms)
	}
}

/// RPC endpoint configuration with failover weight
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RpcUrl {
	/// Type of RPC endpoint (only "rpc" is supported)
	#[serde(default = "RpcUrl::default_type")]
	pub type_: String,

	/// URL of the RPC endpoint (can be a secret value)
	pub url: SecretValue,

	/// Weight for endpoint selection (0-100); zero disables the endpoint
	pub weight: u32,
}

impl RpcUrl {
	/// Creates a plain `rpc` endpoint.
	pub fn new(url: impl Into<String>, weight: u32) -> Self {
		Self {
			type_: Self::default_type(),
			url: SecretValue::plain(url),
			weight,
		}
	}

	fn default_type() -> String {
		"rpc".to_string()
	}
}
