//! Exporter configuration loading and validation.
//!
//! Sources are applied in order: JSON file (or built-in defaults), environment
//! overrides, secret resolution, validation.

use async_trait::async_trait;
use std::{collections::HashMap, env, path::Path};
use url::Url;

use crate::{
	models::{config::error::ConfigError, ConfigLoader, ExporterConfig, RpcUrl, SecretValue},
	utils::parse_interval_seconds,
};

/// File loaded when no path is given and it exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/exporter.json";

const MAX_WINDOW_SIZE: u64 = 1000;
const API_KEY_PARAM: &str = "dkey";

fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

/// Appends `dkey=<api_key>` to `url`, replacing any `dkey` already present.
fn with_api_key(url: &str, api_key: &str) -> Result<String, ConfigError> {
	let mut parsed = Url::parse(url).map_err(|e| {
		ConfigError::validation_error(
			format!("invalid RPC URL: {}", e),
			Some(Box::new(e)),
			None,
		)
	})?;

	let kept: Vec<(String, String)> = parsed
		.query_pairs()
		.filter(|(key, _)| key != API_KEY_PARAM)
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();

	parsed
		.query_pairs_mut()
		.clear()
		.extend_pairs(kept)
		.append_pair(API_KEY_PARAM, api_key);

	Ok(parsed.to_string())
}

impl ExporterConfig {
	/// Loads the configuration for this process.
	///
	/// # Arguments
	/// * `path` - Explicit config file; when `None`, [`DEFAULT_CONFIG_PATH`] is used if it
	///   exists and built-in defaults otherwise
	///
	/// # Returns
	/// * `Result<ExporterConfig, ConfigError>` - The resolved and validated configuration
	pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(path) => Self::load_from_path(path).await,
			None => {
				let default_path = Path::new(DEFAULT_CONFIG_PATH);
				if default_path.exists() {
					Self::load_from_path(default_path).await
				} else {
					tracing::debug!("No config file found, using defaults");
					Self::default().finalize().await
				}
			}
		}
	}

	/// Applies overrides from the process environment.
	pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
		self.apply_overrides(|key| env::var(key).ok())
	}

	/// Applies overrides from `lookup`, treating empty values as unset.
	///
	/// - `MONAD_RPC_URL` replaces the endpoint list with a single endpoint
	/// - `MONAD_RPC_KEY` sets the API key
	/// - `POLL_INTERVAL` sets the collection interval, in whole seconds
	/// - `WINDOW_SIZE` sets the number of trailing blocks
	/// - `PER_BLOCK_SERIES` (`true`/`false`) toggles block-number labeled series
	pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		if let Some(url) = lookup("MONAD_RPC_URL") {
			self.rpc_urls = vec![RpcUrl::new(url.trim(), 100)];
		}

		if let Some(key) = lookup("MONAD_RPC_KEY") {
			self.rpc_api_key = Some(SecretValue::plain(key.trim()));
		}

		if let Some(raw) = lookup("POLL_INTERVAL") {
			let interval = parse_interval_seconds(&raw).map_err(|e| {
				ConfigError::parse_error(
					format!("invalid POLL_INTERVAL: {}", e),
					None,
					Some(HashMap::from([("value".to_string(), raw.clone())])),
				)
			})?;
			self.collection_interval_ms = interval.as_millis() as u64;
		}

		if let Some(raw) = lookup("WINDOW_SIZE") {
			self.window_size = raw.trim().parse::<u64>().map_err(|e| {
				ConfigError::parse_error(
					format!("invalid WINDOW_SIZE: {}", e),
					Some(Box::new(e)),
					Some(HashMap::from([("value".to_string(), raw.clone())])),
				)
			})?;
		}

		if let Some(raw) = lookup("PER_BLOCK_SERIES") {
			self.per_block_series = raw.trim().parse::<bool>().map_err(|e| {
				ConfigError::parse_error(
					format!("invalid PER_BLOCK_SERIES: {}", e),
					Some(Box::new(e)),
					Some(HashMap::from([("value".to_string(), raw.clone())])),
				)
			})?;
		}

		Ok(())
	}

	async fn finalize(mut self) -> Result<Self, ConfigError> {
		self.apply_env_overrides()?;
		let config = self.resolve_secrets().await?;
		config.validate()?;
		Ok(config)
	}
}

#[async_trait]
impl ConfigLoader for ExporterConfig {
	/// Load the exporter configuration from a JSON file, then apply environment
	/// overrides, resolve secrets and validate.
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(
				"config file must have a .json extension",
				None,
				path_metadata(path),
			));
		}

		let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to read exporter config file: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		let config: ExporterConfig = serde_json::from_str(&contents).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse exporter config: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		config.finalize().await
	}

	/// Resolve RPC URLs and the API key into plain values, appending the key to every URL.
	async fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		let mut config = self.clone();

		let api_key = match &config.rpc_api_key {
			Some(secret) => {
				let resolved = secret.resolve().map_err(|e| {
					ConfigError::parse_error(
						format!("failed to resolve RPC API key: {}", e),
						Some(e),
						None,
					)
				})?;
				Some(resolved)
			}
			None => None,
		};

		for rpc_url in &mut config.rpc_urls {
			let resolved = rpc_url.url.resolve().map_err(|e| {
				ConfigError::parse_error(
					format!("failed to resolve RPC URL: {}", e),
					Some(e),
					None,
				)
			})?;

			let url = match &api_key {
				Some(key) => with_api_key(resolved.as_str(), key.as_str())?,
				None => resolved.as_str().to_string(),
			};
			rpc_url.url = SecretValue::plain(url);
		}

		if let Some(key) = api_key {
			config.rpc_api_key = Some(SecretValue::Plain(key));
		}

		Ok(config)
	}

	/// Validate the exporter configuration
	///
	/// Ensures that:
	/// - The exporter has a name
	/// - At least one `rpc` endpoint has a non-zero weight
	/// - Every endpoint is an http(s) URL with a weight of at most 100
	/// - The window size and collection interval are in range
	fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Exporter name is required",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.type_ == "rpc") {
			return Err(ConfigError::validation_error(
				"RPC URL type must be one of: rpc",
				None,
				None,
			));
		}

		if !self
			.rpc_urls
			.iter()
			.any(|rpc_url| rpc_url.weight > 0)
		{
			return Err(ConfigError::validation_error(
				"At least one RPC URL with a weight above 0 is required",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(ConfigError::validation_error(
				"All RPC URLs must start with http:// or https://",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(ConfigError::validation_error(
				"All RPC URL weights must be between 0 and 100",
				None,
				None,
			));
		}

		if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
			return Err(ConfigError::validation_error(
				format!("window_size must be between 1 and {}", MAX_WINDOW_SIZE),
				None,
				Some(HashMap::from([(
					"window_size".to_string(),
					self.window_size.to_string(),
				)])),
			));
		}

		if self.collection_interval_ms == 0 {
			return Err(ConfigError::validation_error(
				"collection_interval_ms must be greater than 0",
				None,
				None,
			));
		}

		self.validate_protocol();

		Ok(())
	}

	/// Warns about plain-text endpoints; the API key would travel unencrypted.
	fn validate_protocol(&self) {
		for rpc_url in &self.rpc_urls {
			if rpc_url.url.starts_with("http://") {
				tracing::warn!(
					"Exporter '{}' uses an insecure RPC URL: {}",
					self.name,
					redact_query(rpc_url.url.as_str())
				);
			}
		}
	}
}

/// Drops the query string so API keys stay out of logs.
fn redact_query(url: &str) -> &str {
	url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}
