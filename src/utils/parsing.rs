//! Parsing utilities
//!
//! Helpers for turning CLI and environment strings into typed values.

use byte_unit::Byte;
use std::{str::FromStr, time::Duration};

/// Parses a human-readable size ("1GB", "500MB", "1024KiB") into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Parses a whole number of seconds (as used by `POLL_INTERVAL`) into a [`Duration`].
///
/// # Arguments
/// * `s` - Decimal seconds, surrounding whitespace allowed
///
/// # Returns
/// * `Result<Duration, String>` - The interval, or an error for zero and non-numeric input
pub fn parse_interval_seconds(s: &str) -> Result<Duration, String> {
	let seconds = s
		.trim()
		.parse::<u64>()
		.map_err(|e| format!("Invalid interval: '{}'. Error: {}", s, e))?;
	if seconds == 0 {
		return Err("Interval must be greater than zero".to_string());
	}
	Ok(Duration::from_secs(seconds))
}
