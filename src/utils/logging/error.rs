//! Error context shared by every error type in the exporter.
//!
//! [`ErrorContext`] carries a message, an optional boxed source, free-form metadata,
//! an RFC 3339 timestamp and a trace id. Errors that wrap an `ErrorContext` implement
//! [`TraceableError`] so that a trace id survives being re-wrapped further up the stack
//! (for example a `TransportError` inside an `RpcError` inside an `AggregatorError`).

use chrono::Utc;
use std::{collections::HashMap, fmt};
use uuid::Uuid;

/// Boxed error type accepted as the source of an [`ErrorContext`].
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message, source and metadata attached to an exporter error.
#[derive(Debug)]
pub struct ErrorContext {
	/// Human readable message
	pub message: String,
	/// Underlying cause, if any
	pub source: Option<BoxedSource>,
	/// Key/value pairs rendered after the message
	pub metadata: Option<HashMap<String, String>>,
	/// Creation time (RFC 3339)
	pub timestamp: String,
	/// Trace id, inherited from the source chain when one is found
	pub trace_id: String,
}

impl ErrorContext {
	/// Creates a new error context.
	///
	/// If `source` (or anything in its chain) already carries a trace id, that id is
	/// reused; otherwise a fresh UUID v4 is generated.
	///
	/// # Arguments
	///
	/// * `message` - Description of the failure
	/// * `source` - Optional underlying error
	/// * `metadata` - Optional key/value pairs
	pub fn new(
		message: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let trace_id = match source.as_ref() {
			Some(src) => TraceableError::trace_id(src.as_ref()),
			None => Uuid::new_v4().to_string(),
		};

		Self {
			message: message.into(),
			source,
			metadata,
			timestamp: Utc::now().to_rfc3339(),
			trace_id,
		}
	}

	/// Same as [`ErrorContext::new`], and emits the error through `tracing::error!`.
	pub fn new_with_log(
		message: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		let context = Self::new(message, source, metadata);
		log_error(&context);
		context
	}

	/// Adds one metadata entry, creating the map on first use.
	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata
			.get_or_insert_with(HashMap::new)
			.insert(key.into(), value.into());
		self
	}

	/// Renders `message [k1=v1, k2=v2]` with keys in alphabetical order.
	///
	/// # Returns
	///
	/// The bare message when there is no metadata.
	pub fn format_with_metadata(&self) -> String {
		let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) else {
			return self.message.clone();
		};

		let mut pairs: Vec<_> = metadata.iter().collect();
		pairs.sort_by(|a, b| a.0.cmp(b.0));
		let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

		format!("{} [{}]", self.message, rendered.join(", "))
	}
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.format_with_metadata())
	}
}

impl std::error::Error for ErrorContext {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source
			.as_ref()
			.map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
	}
}

/// Errors that expose the trace id of their [`ErrorContext`].
pub trait TraceableError: std::error::Error + Send + Sync {
	/// Returns the trace id for this error
	fn trace_id(&self) -> String;
}

impl TraceableError for dyn std::error::Error + Send + Sync + 'static {
	fn trace_id(&self) -> String {
		const MAX_DEPTH: usize = 4;

		let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
		let mut depth = 0;

		while let Some(err) = current {
			if depth > MAX_DEPTH {
				break;
			}
			if let Some(id) = try_extract_trace_id(err) {
				return id;
			}
			current = err.source();
			depth += 1;
		}

		Uuid::new_v4().to_string()
	}
}

/// Looks for a trace id on a single error (not its chain).
fn try_extract_trace_id(err: &(dyn std::error::Error + 'static)) -> Option<String> {
	if let Some(ctx) = err.downcast_ref::<ErrorContext>() {
		return Some(ctx.trace_id.clone());
	}

	macro_rules! try_downcast {
		($($ty:path),* $(,)?) => {
			$(
				if let Some(e) = err.downcast_ref::<$ty>() {
					return Some(e.trace_id());
				}
			)*
		}
	}

	try_downcast!(
		crate::services::blockchain::TransportError,
		crate::services::blockchain::RpcError,
		crate::services::aggregator::AggregatorError,
		crate::services::sink::SinkError,
		crate::services::collector::CollectorError,
		crate::models::ConfigError,
		crate::models::SecurityError,
	);

	None
}

/// Drops an HTML error page from a message, keeping the text before it.
fn strip_html(message: &str) -> String {
	let looks_like_html = ["<html", "<head>", "<body>", "<!DOCTYPE"]
		.iter()
		.any(|tag| message.contains(tag));

	match message.find('<') {
		Some(pos) if looks_like_html => message[..pos].trim().to_string(),
		_ => message.to_string(),
	}
}

/// Renders an error and its sources, one `Caused by:` line per level.
fn format_error_chain(err: &dyn std::error::Error) -> String {
	let mut rendered = strip_html(&err.to_string());
	let mut source = err.source();

	while let Some(cause) = source {
		rendered.push_str("\n\tCaused by: ");
		rendered.push_str(&strip_html(&cause.to_string()));
		source = cause.source();
	}

	rendered
}

/// Borrows the metadata map as `(key, value)` pairs.
pub fn metadata_to_fields(metadata: &Option<HashMap<String, String>>) -> Vec<(&str, &str)> {
	metadata
		.iter()
		.flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())))
		.collect()
}

fn log_error(error: &ErrorContext) {
	match &error.source {
		Some(source) => tracing::error!(
			message = error.format_with_metadata(),
			trace_id = %error.trace_id,
			timestamp = %error.timestamp,
			error.chain = %format_error_chain(&**source),
			"Error occurred"
		),
		None => tracing::error!(
			message = error.format_with_metadata(),
			trace_id = %error.trace_id,
			timestamp = %error.timestamp,
			"Error occurred"
		),
	}
}
