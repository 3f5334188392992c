//! Ledger access over JSON-RPC.
//!
//! - [`transports`]: HTTP plumbing with endpoint failover
//! - [`RpcClient`]: one call, envelope unwrapping, latency and error series
//! - [`BlockFetcher`]: typed accessors for the methods the exporter reads
//! - [`RpcError`]: classification of call failures

mod error;
mod fetcher;
mod rpc;
mod transports;

pub use error::{mentions_rate_limit, RpcError};
pub use fetcher::{BlockFetcher, EvmBlockFetcher};
pub use rpc::RpcClient;
pub use transports::{
	redact_url, BlockchainTransport, EndpointManager, HttpTransportClient, RotatingTransport,
	TransientErrorRetryStrategy, TransportError, ROTATE_ON_ERROR_CODES,
};
