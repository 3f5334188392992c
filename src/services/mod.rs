//! Services that make up the exporter.
//!
//! - `blockchain`: JSON-RPC transport, client and block fetcher
//! - `aggregator`: Trailing-window aggregation of chain data
//! - `sink`: Snapshot store and Prometheus projection
//! - `collector`: Recurring collection cycles

pub mod aggregator;
pub mod blockchain;
pub mod collector;
pub mod sink;
