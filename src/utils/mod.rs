//! Utility modules for common functionality.
//!
//! - hex: Quantity codec for JSON-RPC hex values
//! - http: HTTP client utilities (i.e. creation of retryable HTTP clients)
//! - logging: Logging utilities and the shared error context
//! - macros: Macros for common functionality
//! - metrics: Prometheus registry and scrape server
//! - parsing: Parsing utilities

pub mod hex;
pub mod http;
pub mod logging;
pub mod macros;
pub mod metrics;
pub mod parsing;

pub use hex::*;
pub use http::*;
pub use parsing::*;
