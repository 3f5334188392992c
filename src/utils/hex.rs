//! Hex quantity codec for ledger JSON-RPC values.
//!
//! Numeric values on the wire are `0x`-prefixed, minimal, lowercase hex strings.
//! Decoding never fails: an empty or absent value is zero, and a malformed value is
//! also zero but comes back flagged as `defaulted` so callers can count it.

use alloy::primitives::U256;
use serde::Serialize;

/// Largest number of significant hex digits a 256-bit value can have.
const MAX_HEX_DIGITS: usize = 64;

/// A decoded quantity plus whether the zero-fallback was applied to malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Quantity {
	pub value: U256,
	pub defaulted: bool,
}

impl Quantity {
	pub const ZERO: Quantity = Quantity {
		value: U256::ZERO,
		defaulted: false,
	};

	/// Wraps an exact value.
	pub fn new(value: U256) -> Self {
		Self {
			value,
			defaulted: false,
		}
	}

	fn defaulted() -> Self {
		Self {
			value: U256::ZERO,
			defaulted: true,
		}
	}

	pub fn is_zero(&self) -> bool {
		self.value.is_zero()
	}

	/// Value clamped to `u64::MAX`.
	pub fn to_u64(&self) -> u64 {
		u256_to_u64(self.value)
	}

	/// Value as a float, losing precision above 2^53.
	pub fn to_f64(&self) -> f64 {
		u256_to_f64(self.value)
	}
}

impl From<u64> for Quantity {
	fn from(value: u64) -> Self {
		Self::new(U256::from(value))
	}
}

/// Decodes a hex quantity.
///
/// # Arguments
/// * `raw` - String with an optional `0x`/`0X` prefix
///
/// # Returns
/// * `Quantity` - zero for `""` and `"0x"`; zero with `defaulted = true` for input that
///   is not hex or does not fit in 256 bits
pub fn decode_quantity(raw: &str) -> Quantity {
	let trimmed = raw.trim();
	let digits = trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
		.unwrap_or(trimmed);

	if digits.is_empty() {
		return Quantity::ZERO;
	}
	if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
		return Quantity::defaulted();
	}

	let significant = digits.trim_start_matches('0');
	if significant.is_empty() {
		return Quantity::ZERO;
	}
	if significant.len() > MAX_HEX_DIGITS {
		return Quantity::defaulted();
	}

	match U256::from_str_radix(significant, 16) {
		Ok(value) => Quantity::new(value),
		Err(_) => Quantity::defaulted(),
	}
}

/// Decodes an optional field; `None` is treated like an empty string.
pub fn decode_optional_quantity(raw: Option<&str>) -> Quantity {
	raw.map(decode_quantity).unwrap_or(Quantity::ZERO)
}

/// Encodes a quantity as `0x` followed by minimal lowercase hex.
pub fn encode_quantity(value: U256) -> String {
	format!("0x{:x}", value)
}

pub fn encode_u64(value: u64) -> String {
	format!("0x{:x}", value)
}

/// Clamps a 256-bit value into a `u64`.
pub fn u256_to_u64(value: U256) -> u64 {
	let limbs = value.as_limbs();
	if limbs[1..].iter().any(|limb| *limb != 0) {
		u64::MAX
	} else {
		limbs[0]
	}
}

/// Converts a 256-bit value into the nearest `f64`.
pub fn u256_to_f64(value: U256) -> f64 {
	value
		.as_limbs()
		.iter()
		.enumerate()
		.map(|(i, limb)| (*limb as f64) * 2f64.powi(64 * i as i32))
		.sum()
}
