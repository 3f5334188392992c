//! Domain models and data structures for the exporter.
//!
//! - `blockchain`: Blocks and transactions as returned by the JSON-RPC node
//! - `config`: Configuration loading and validation
//! - `core`: Exporter configuration and the published chain snapshot
//! - `security`: Security models (Secret)

mod blockchain;
mod config;
mod core;
mod security;

pub use blockchain::{Block, BlockTag, BlockTransaction, Transaction, TransactionKind};

pub use core::{
	BlockBreakdown, ChainInfo, ChainSnapshot, CurrentBlock, ExporterConfig, RpcUrl,
	DEFAULT_RPC_URL,
};

pub use config::{ConfigError, ConfigLoader};

pub use security::{get_env_var, SecretString, SecretValue, SecurityError, SecurityResult};
