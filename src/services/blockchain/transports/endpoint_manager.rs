//! Active and fallback RPC endpoints.
//!
//! Requests go to the active URL. A 429 or a network failure moves the active URL to
//! the back of the fallback list and promotes the first fallback that answers a probe,
//! then the request is replayed there. With no usable fallback the original failure
//! is returned.

use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::services::blockchain::transports::{
	redact_url, RotatingTransport, TransportError, ROTATE_ON_ERROR_CODES,
};

/// Tracks the active endpoint and its fallbacks
///
/// # Fields
/// * `active_url` - Endpoint currently receiving requests
/// * `fallback_urls` - Endpoints to rotate to, in preference order
/// * `client` - HTTP client shared by every endpoint
/// * `rotation_lock` - Serializes rotations between concurrent requests
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	rotation_lock: Arc<Mutex<()>>,
}

/// Result of sending one request to one URL
#[derive(Debug)]
enum Attempt {
	/// A response arrived (its status may still be an error)
	Response(reqwest::Response),
	/// The request never got a response
	NetworkError(reqwest_middleware::Error),
	/// The body could not be built
	SerializationError(TransportError),
}

impl EndpointManager {
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			rotation_lock: Arc::new(Mutex::new(())),
			client,
		}
	}

	/// Promotes the first fallback that accepts a connection.
	///
	/// # Arguments
	/// * `transport` - Transport used to probe and adopt the candidate
	///
	/// # Returns
	/// * `Result<String, TransportError>` - The new active URL, or `UrlRotation` when no
	///   fallback differs from the active URL or the candidate cannot be adopted
	pub async fn try_rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<String, TransportError> {
		let _guard = self.rotation_lock.lock().await;
		let previous_url = self.active_url.read().await.clone();
		let candidate = self
			.fallback_urls
			.read()
			.await
			.iter()
			.find(|url| **url != previous_url)
			.cloned();

		let Some(candidate) = candidate else {
			return Err(TransportError::url_rotation(
				format!(
					"No fallback URLs available for '{}'",
					redact_url(&previous_url)
				),
				None,
				None,
			));
		};

		transport.try_connect(&candidate).await.map_err(|e| {
			TransportError::url_rotation(
				format!("Failed to connect to new URL '{}'", redact_url(&candidate)),
				Some(e.into()),
				None,
			)
		})?;

		transport.update_client(&candidate).await.map_err(|e| {
			TransportError::url_rotation(
				format!(
					"Failed to update transport client with new URL '{}'",
					redact_url(&candidate)
				),
				Some(e.into()),
				None,
			)
		})?;

		let mut active = self.active_url.write().await;
		let mut fallbacks = self.fallback_urls.write().await;
		fallbacks.retain(|url| *url != candidate);
		fallbacks.push(previous_url.clone());
		*active = candidate.clone();

		tracing::info!(
			from = %redact_url(&previous_url),
			to = %redact_url(&candidate),
			"Rotated RPC endpoint"
		);

		Ok(candidate)
	}

	async fn attempt<P>(
		&self,
		url: &str,
		transport: &impl RotatingTransport,
		method: &str,
		params: Option<P>,
	) -> Attempt
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = transport.customize_request(method, params).await;

		let body = match serde_json::to_string(&request_body) {
			Ok(body) => body,
			Err(e) => {
				return Attempt::SerializationError(TransportError::request_serialization(
					"Failed to serialize request JSON",
					Some(Box::new(e)),
					None,
				));
			}
		};

		match self
			.client
			.post(url)
			.header("Content-Type", "application/json")
			.body(body)
			.send()
			.await
		{
			Ok(response) => Attempt::Response(response),
			Err(e) => Attempt::NetworkError(e),
		}
	}

	/// Sends a JSON-RPC request to the active endpoint, rotating on 429 and network errors.
	///
	/// # Arguments
	/// * `transport` - Transport that builds the envelope and performs rotations
	/// * `method` - JSON-RPC method name
	/// * `params` - Method parameters
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - The parsed JSON body of the first successful
	///   response; its JSON-RPC `error` field is not inspected here. Each fallback is
	///   tried at most once per request.
	pub async fn send_raw_request<T, P>(
		&self,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		T: RotatingTransport,
		P: Into<Value> + Send + Clone + Serialize,
	{
		let max_rotations = self.fallback_urls.read().await.len();
		let mut rotations = 0;

		loop {
			let url = self.active_url.read().await.clone();

			match self.attempt(&url, transport, method, params.clone()).await {
				Attempt::Response(response) => {
					let status = response.status();
					if status.is_success() {
						return response.json().await.map_err(|e| {
							TransportError::response_parse(
								format!("Failed to parse JSON response for {}", method),
								Some(Box::new(e)),
								None,
							)
						});
					}

					let body = response.text().await.unwrap_or_default();
					tracing::warn!(
						url = %redact_url(&url),
						%status,
						method,
						"RPC request failed"
					);

					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(TransportError::http(status, redact_url(&url), body, None, None));
					}

					if rotations >= max_rotations {
						return Err(TransportError::http(status, redact_url(&url), body, None, None));
					}
					rotations += 1;

					if let Err(rotation_error) = self.try_rotate_url(transport).await {
						return Err(TransportError::http(
							status,
							redact_url(&url),
							body,
							Some(Box::new(rotation_error)),
							None,
						));
					}
				}
				Attempt::NetworkError(network_error) => {
					tracing::warn!(
						url = %redact_url(&url),
						method,
						error = %network_error,
						"RPC request could not be sent"
					);

					if rotations >= max_rotations {
						return Err(TransportError::network(network_error.to_string(), None, None));
					}
					rotations += 1;

					if let Err(rotation_error) = self.try_rotate_url(transport).await {
						return Err(TransportError::network(
							network_error.to_string(),
							Some(Box::new(rotation_error)),
							None,
						));
					}
				}
				Attempt::SerializationError(e) => return Err(e),
			}
		}
	}
}
