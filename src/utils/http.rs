//! HTTP client construction with optional transient-error retries.
//!
//! The exporter does not retry RPC calls by default: a failed block is skipped and the
//! next collection cycle acts as the retry. Operators that front a flaky node can opt in
//! by raising `rpc_retry.max_retries`.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	policies::ExponentialBackoff, Jitter, RetryTransientMiddleware, RetryableStrategy,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_retries() -> u32 {
	0
}

fn default_initial_backoff() -> Duration {
	Duration::from_millis(250)
}

fn default_max_backoff() -> Duration {
	Duration::from_secs(10)
}

fn default_base_for_backoff() -> u32 {
	2
}

/// Serializable setting for jitter in retry policies
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
	/// Backoff durations are used as computed
	None,
	/// Backoff durations are randomized
	#[default]
	Full,
}

/// Retry policy for RPC HTTP requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RetryConfig {
	/// Maximum number of retries for transient errors (0 disables retries)
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// Base for the exponential backoff
	#[serde(default = "default_base_for_backoff")]
	pub base_for_backoff: u32,
	/// Backoff before the first retry
	#[serde(default = "default_initial_backoff")]
	pub initial_backoff: Duration,
	/// Upper bound for any single backoff
	#[serde(default = "default_max_backoff")]
	pub max_backoff: Duration,
	#[serde(default)]
	pub jitter: JitterSetting,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_retries(),
			base_for_backoff: default_base_for_backoff(),
			initial_backoff: default_initial_backoff(),
			max_backoff: default_max_backoff(),
			jitter: JitterSetting::default(),
		}
	}
}

/// Wraps `base_client` in a retry middleware built from `config`.
///
/// # Arguments
/// * `config` - Retry policy
/// * `base_client` - Client carrying timeouts and pool settings
/// * `custom_strategy` - Strategy deciding which outcomes are transient; the
///   middleware default is used when `None`
///
/// # Returns
/// A `ClientWithMiddleware` ready to be shared between requests
pub fn create_retryable_http_client<S>(
	config: &RetryConfig,
	base_client: reqwest::Client,
	custom_strategy: Option<S>,
) -> ClientWithMiddleware
where
	S: RetryableStrategy + Send + Sync + 'static,
{
	let jitter = match config.jitter {
		JitterSetting::None => Jitter::None,
		JitterSetting::Full => Jitter::Full,
	};

	let retry_policy = ExponentialBackoff::builder()
		.jitter(jitter)
		.base(config.base_for_backoff)
		.retry_bounds(config.initial_backoff, config.max_backoff)
		.build_with_max_retries(config.max_retries);

	let builder = ClientBuilder::new(base_client);
	let builder = match custom_strategy {
		Some(strategy) => builder.with(RetryTransientMiddleware::new_with_policy_and_strategy(
			retry_policy,
			strategy,
		)),
		None => builder.with(RetryTransientMiddleware::new_with_policy(retry_policy)),
	};
	builder.build()
}
