//! Publication of cycle results.
//!
//! A [`MetricsSink`] receives each finished snapshot and the outcome of every cycle.
//! [`PrometheusSink`] stores the snapshot in a [`SnapshotStore`] and mirrors it onto
//! the exporter's Prometheus series.

mod error;
mod exposition;
mod store;

pub use error::SinkError;
pub use exposition::PrometheusSink;
pub use store::SnapshotStore;

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::{models::ChainSnapshot, services::collector::CycleResult};

#[async_trait]
pub trait MetricsSink: Send + Sync {
	/// Makes `snapshot` the published state.
	///
	/// # Returns
	/// * `Result<Arc<ChainSnapshot>, SinkError>` - The stored snapshot; on error the store
	///   has already been replaced but some series may hold older values
	async fn publish(&self, snapshot: ChainSnapshot) -> Result<Arc<ChainSnapshot>, SinkError>;

	/// Counts one cycle outcome and records how long the cycle took.
	fn record_cycle(&self, result: &CycleResult, duration: Duration);

	/// Last published snapshot, the empty default before the first publish.
	async fn latest(&self) -> Arc<ChainSnapshot>;
}
