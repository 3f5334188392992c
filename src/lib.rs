//! Prometheus exporter for Monad JSON-RPC nodes.
//!
//! The exporter polls a node on a fixed interval, aggregates a trailing window of
//! blocks and publishes the results as Prometheus series.
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires the services together
//! - `models`: Configuration, ledger data and the published snapshot
//! - `services`: RPC access, aggregation, publication and scheduling
//! - `utils`: Hex codec, logging, metrics, HTTP helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
