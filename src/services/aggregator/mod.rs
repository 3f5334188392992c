//! Trailing-window aggregation.
//!
//! - [`window`]: the per-cycle fold and derived averages
//! - [`WindowAggregator`]: runs one cycle against a [`crate::services::blockchain::BlockFetcher`]
//! - [`AggregatorError`]: failures that abort a cycle

mod error;
mod service;
pub mod window;

pub use crate::models::BlockBreakdown;
pub use error::AggregatorError;
pub use service::{
	AggregatorConfig, CycleIssue, CycleReport, WindowAggregator, WindowAggregatorTrait,
};
pub use window::{WindowStats, WindowSummary};
