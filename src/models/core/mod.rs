//! Core domain models.
//!
//! - `exporter`: Exporter configuration and RPC endpoint definitions
//! - `snapshot`: The published chain snapshot

mod exporter;
mod snapshot;

pub use exporter::{ExporterConfig, RpcUrl, DEFAULT_RPC_URL};
pub use snapshot::{BlockBreakdown, ChainInfo, ChainSnapshot, CurrentBlock};
