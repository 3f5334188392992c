//! Mock implementations for testing purposes.
//!
//! - Transports answering JSON-RPC calls without a node
//! - A block fetcher whose answers are set per test
//! - Builders for blocks, transactions and envelopes
//!
//! The mocks are implemented using the `mockall` crate.

mod models;
mod transports;

#[allow(unused_imports)]
pub use fetcher::*;
#[allow(unused_imports)]
pub use models::*;
#[allow(unused_imports)]
pub use transports::*;
