//! Metric projection errors.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum SinkError {
	/// A labeled series could not be resolved
	#[error("Metric error: {0}")]
	MetricError(ErrorContext),
}

impl SinkError {
	pub fn metric_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::MetricError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for SinkError {
	fn trace_id(&self) -> String {
		match self {
			Self::MetricError(ctx) => ctx.trace_id.clone(),
		}
	}
}
