//! Security models
//!
//! - `error`: Error types for secret resolution
//! - `secret`: Secret values with zeroization, sourced inline or from the environment

mod error;
mod secret;

use std::env;

pub use error::{SecurityError, SecurityResult};
pub use secret::{SecretString, SecretValue};

/// Reads a required environment variable.
pub fn get_env_var(key: &str) -> SecurityResult<String> {
	env::var(key).map_err(|e| {
		Box::new(SecurityError::parse_error(
			format!("Missing {} environment variable", key),
			Some(e.into()),
			None,
		))
	})
}
