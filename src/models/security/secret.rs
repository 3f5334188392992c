//! Secret values for configuration.
//!
//! A [`SecretValue`] is written in configuration either inline or as the name of an
//! environment variable, and resolved into a [`SecretString`] when the configuration
//! is loaded. Both zeroize their contents on drop.

use serde::{Deserialize, Serialize};
use std::{env, fmt};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
	impl_case_insensitive_enum,
	models::security::error::{SecurityError, SecurityResult},
};

/// Where a secret comes from.
///
/// Serialized as `{"type": "plain" | "environment", "value": "..."}`; the `type` tag
/// is matched case-insensitively.
#[derive(Clone, Serialize, ZeroizeOnDrop)]
#[serde(tag = "type", content = "value")]
pub enum SecretValue {
	/// The secret itself
	Plain(SecretString),
	/// Name of the environment variable holding the secret
	Environment(String),
}

impl_case_insensitive_enum!(SecretValue, {
	"plain" => Plain,
	"environment" => Environment,
});

impl PartialEq for SecretValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Plain(l), Self::Plain(r)) => l.as_str() == r.as_str(),
			(Self::Environment(l), Self::Environment(r)) => l == r,
			_ => false,
		}
	}
}

impl fmt::Debug for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SecretValue::Plain(secret) => f.debug_tuple("Plain").field(secret).finish(),
			SecretValue::Environment(name) => f.debug_tuple("Environment").field(name).finish(),
		}
	}
}

impl SecretValue {
	/// Shorthand for an inline value.
	pub fn plain(value: impl Into<String>) -> Self {
		SecretValue::Plain(SecretString::new(value.into()))
	}

	/// Resolves the secret from its source.
	///
	/// # Errors
	///
	/// Returns a `SecurityError` when the referenced environment variable is not set.
	pub fn resolve(&self) -> SecurityResult<SecretString> {
		match self {
			SecretValue::Plain(secret) => Ok(secret.clone()),
			SecretValue::Environment(name) => env::var(name).map(SecretString::new).map_err(|e| {
				Box::new(SecurityError::parse_error(
					format!("Failed to get environment variable {}", name),
					Some(e.into()),
					None,
				))
			}),
		}
	}

	pub fn starts_with(&self, prefix: &str) -> bool {
		self.as_str().starts_with(prefix)
	}

	pub fn is_empty(&self) -> bool {
		self.as_str().trim().is_empty()
	}

	/// The inline value, or the variable name for environment secrets.
	pub fn as_str(&self) -> &str {
		match self {
			SecretValue::Plain(secret) => secret.as_str(),
			SecretValue::Environment(name) => name,
		}
	}
}

impl Zeroize for SecretValue {
	fn zeroize(&mut self) {
		match self {
			SecretValue::Plain(secret) => secret.zeroize(),
			SecretValue::Environment(name) => name.clear(),
		}
	}
}

/// A string that is zeroized when dropped and redacted in `Debug` output.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(value: String) -> Self {
		Self(value)
	}

	/// Exposes the secret. Use the reference immediately; do not store it.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretString(***)")
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl AsRef<str> for SecretValue {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}
