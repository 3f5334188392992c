//! RPC call failures.
//!
//! Every failure of a single JSON-RPC call is classified into one of four kinds. Only
//! the rate-limited kind changes caller behavior (an extra backoff before the next block
//! fetch); the others are logged and counted.

use crate::{
	services::blockchain::transports::TransportError,
	utils::logging::error::{ErrorContext, TraceableError},
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Text that marks an upstream throttling response
const RATE_LIMIT_MARKER: &str = "too many request";

/// Returns true when `text` contains the throttling marker, ignoring case.
pub fn mentions_rate_limit(text: &str) -> bool {
	text.to_lowercase().contains(RATE_LIMIT_MARKER)
}

#[derive(ThisError, Debug)]
pub enum RpcError {
	/// The request never produced a usable HTTP response
	#[error("Transport error: {0}")]
	Transport(ErrorContext),

	/// The node or a proxy in front of it throttled the request
	#[error("Rate limited: {0}")]
	RateLimited(ErrorContext),

	/// The response was not the expected shape
	#[error("Decode error: {0}")]
	Decode(ErrorContext),

	/// The envelope carried a populated `error` field
	#[error("RPC error {code}: {message}")]
	Rpc {
		code: i64,
		message: String,
		context: ErrorContext,
	},
}

impl RpcError {
	pub fn transport(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Transport(ErrorContext::new(msg, source, metadata))
	}

	pub fn rate_limited(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RateLimited(ErrorContext::new(msg, source, metadata))
	}

	pub fn decode(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Decode(ErrorContext::new(msg, source, metadata))
	}

	pub fn rpc(
		code: i64,
		message: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let message = message.into();
		let context = ErrorContext::new(format!("RPC error {}: {}", code, message), None, metadata);
		Self::Rpc {
			code,
			message,
			context,
		}
	}

	/// Classifies a transport failure.
	///
	/// HTTP 429 and bodies mentioning "too many request" become [`RpcError::RateLimited`],
	/// unparsable bodies become [`RpcError::Decode`], and everything else
	/// [`RpcError::Transport`].
	pub fn from_transport(method: &str, error: TransportError) -> Self {
		let metadata = Some(HashMap::from([("method".to_string(), method.to_string())]));

		let throttled = error
			.status_code()
			.map(|status| status == reqwest::StatusCode::TOO_MANY_REQUESTS)
			.unwrap_or(false)
			|| mentions_rate_limit(error.body());

		if throttled {
			return Self::rate_limited(
				format!("{} was rate limited", method),
				Some(Box::new(error)),
				metadata,
			);
		}

		match error {
			TransportError::ResponseParse(_) => Self::decode(
				format!("{} returned a body that is not JSON", method),
				Some(Box::new(error)),
				metadata,
			),
			_ => Self::transport(
				format!("{} request failed", method),
				Some(Box::new(error)),
				metadata,
			),
		}
	}

	/// True for throttling failures, which call for the longer backoff.
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimited(_))
	}

	/// Short label for logs and cycle issues.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Transport(_) => "transport",
			Self::RateLimited(_) => "rate_limited",
			Self::Decode(_) => "decode",
			Self::Rpc { .. } => "rpc",
		}
	}
}

impl TraceableError for RpcError {
	fn trace_id(&self) -> String {
		match self {
			Self::Transport(ctx) | Self::RateLimited(ctx) | Self::Decode(ctx) => ctx.trace_id.clone(),
			Self::Rpc { context, .. } => context.trace_id.clone(),
		}
	}
}
