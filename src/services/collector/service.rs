//! Recurring collection loop.
//!
//! One cycle runs immediately, then the loop sleeps for the collection interval after
//! each cycle finishes, so cycles never overlap. A failed cycle is logged and counted,
//! and the next one runs on schedule.

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::Instant};

use crate::{
	models::ChainSnapshot,
	services::{
		aggregator::{CycleIssue, WindowAggregatorTrait},
		collector::error::CollectorError,
		sink::MetricsSink,
	},
	utils::logging::error::TraceableError,
};

/// Outcome of one collection cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
	/// Everything was refreshed
	Success,
	/// A snapshot was published but some values could not be refreshed
	Partial(Vec<CycleIssue>),
	/// Nothing was published
	Failed(String),
}

impl CycleResult {
	/// Value of the `result` label on `monad_collection_cycles_total`.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Partial(_) => "partial",
			Self::Failed(_) => "failed",
		}
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed(_))
	}
}

/// Drives the aggregator on a fixed interval and hands results to the sink
pub struct CollectorService<A, S> {
	aggregator: Arc<A>,
	sink: Arc<S>,
	interval: Duration,
}

impl<A, S> CollectorService<A, S>
where
	A: WindowAggregatorTrait,
	S: MetricsSink,
{
	pub fn new(aggregator: Arc<A>, sink: Arc<S>, interval: Duration) -> Self {
		Self {
			aggregator,
			sink,
			interval,
		}
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Runs one cycle, publishes its snapshot when there is one, and records the outcome.
	pub async fn run_cycle(&self) -> CycleResult {
		self.cycle().await.0
	}

	async fn cycle(&self) -> (CycleResult, Option<Arc<ChainSnapshot>>) {
		let started = Instant::now();
		let previous = self.sink.latest().await;

		let (result, published) = match self.aggregator.collect(&previous).await {
			Ok(report) => match self.sink.publish(report.snapshot).await {
				Ok(snapshot) if report.issues.is_empty() => {
					tracing::info!(
						block = snapshot.block_number,
						blocks_fetched = snapshot.window_blocks_fetched,
						tps = snapshot.transactions_per_second,
						"Collection cycle completed"
					);
					(CycleResult::Success, Some(snapshot))
				}
				Ok(snapshot) => {
					for issue in &report.issues {
						tracing::warn!(block = snapshot.block_number, %issue, "Collection cycle issue");
					}
					tracing::warn!(
						block = snapshot.block_number,
						issues = report.issues.len(),
						"Collection cycle completed with issues"
					);
					(CycleResult::Partial(report.issues), Some(snapshot))
				}
				Err(e) => {
					tracing::error!(error = %e, trace_id = %e.trace_id(), "Failed to publish snapshot");
					(CycleResult::Failed(e.to_string()), None)
				}
			},
			Err(e) => {
				tracing::error!(error = %e, trace_id = %e.trace_id(), "Collection cycle failed");
				(CycleResult::Failed(e.to_string()), None)
			}
		};

		self.sink.record_cycle(&result, started.elapsed());
		(result, published)
	}

	/// Runs a single cycle and returns what it published.
	///
	/// # Returns
	/// * `Result<Arc<ChainSnapshot>, CollectorError>` - The published snapshot, or
	///   `CycleFailed` when nothing was published
	pub async fn collect_once(&self) -> Result<Arc<ChainSnapshot>, CollectorError> {
		match self.cycle().await {
			(_, Some(snapshot)) => Ok(snapshot),
			(result, None) => {
				let reason = match result {
					CycleResult::Failed(reason) => reason,
					other => other.label().to_string(),
				};
				Err(CollectorError::cycle_failed(reason, None, None))
			}
		}
	}

	/// Runs cycles until `shutdown` turns `true`.
	///
	/// # Errors
	///
	/// Returns `ShutdownChannelClosed` when the sender is dropped without signalling.
	pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), CollectorError> {
		tracing::info!(interval = ?self.interval, "Collector started");

		loop {
			if *shutdown.borrow() {
				break;
			}

			self.run_cycle().await;

			if self.wait_for_next_cycle(&mut shutdown).await? {
				break;
			}
		}

		tracing::info!("Collector stopped");
		Ok(())
	}

	/// Sleeps for the interval; returns `true` if shutdown was signalled meanwhile.
	async fn wait_for_next_cycle(
		&self,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<bool, CollectorError> {
		let sleep = tokio::time::sleep(self.interval);
		tokio::pin!(sleep);

		loop {
			tokio::select! {
				_ = &mut sleep => return Ok(false),
				changed = shutdown.changed() => {
					changed.map_err(|e| {
						CollectorError::shutdown_channel_closed(
							"shutdown sender dropped",
							Some(Box::new(e)),
							None,
						)
					})?;
					if *shutdown.borrow() {
						return Ok(true);
					}
				}
			}
		}
	}
}
