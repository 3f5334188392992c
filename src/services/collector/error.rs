//! Collector error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum CollectorError {
	/// A cycle ended without publishing
	#[error("Cycle failed: {0}")]
	CycleFailed(ErrorContext),

	/// The shutdown sender was dropped without signalling
	#[error("Shutdown channel closed: {0}")]
	ShutdownChannelClosed(ErrorContext),
}

impl CollectorError {
	pub fn cycle_failed(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::CycleFailed(ErrorContext::new(msg, source, metadata))
	}

	pub fn shutdown_channel_closed(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ShutdownChannelClosed(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for CollectorError {
	fn trace_id(&self) -> String {
		match self {
			Self::CycleFailed(ctx) | Self::ShutdownChannelClosed(ctx) => ctx.trace_id.clone(),
		}
	}
}
