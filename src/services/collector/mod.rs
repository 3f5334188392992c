//! Scheduling of collection cycles.

mod error;
mod service;

pub use error::CollectorError;
pub use service::{CollectorService, CycleResult};
