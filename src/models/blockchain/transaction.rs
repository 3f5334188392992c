//! Transaction data structures.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::hex::{decode_optional_quantity, Quantity};

/// Fee-model family of a transaction, derived from its `type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
	/// Type 0, or no type field at all
	Legacy,
	/// Type 1 (access lists)
	Eip2930,
	/// Type 2 (base fee plus priority fee)
	Eip1559,
	/// Any other type code
	Unknown,
}

impl TransactionKind {
	/// Every kind, in label order.
	pub const ALL: [TransactionKind; 4] = [
		TransactionKind::Legacy,
		TransactionKind::Eip2930,
		TransactionKind::Eip1559,
		TransactionKind::Unknown,
	];

	/// Value used for the `type` label.
	pub fn label(&self) -> &'static str {
		match self {
			TransactionKind::Legacy => "legacy",
			TransactionKind::Eip2930 => "eip2930",
			TransactionKind::Eip1559 => "eip1559",
			TransactionKind::Unknown => "unknown",
		}
	}

	/// Maps a raw type code; `None` means the node omitted the field.
	pub fn from_type_code(raw: Option<&str>) -> Self {
		let Some(raw) = raw else {
			return TransactionKind::Legacy;
		};
		let code = crate::utils::hex::decode_quantity(raw);
		if code.defaulted {
			return TransactionKind::Unknown;
		}
		match code.to_u64() {
			0 => TransactionKind::Legacy,
			1 => TransactionKind::Eip2930,
			2 => TransactionKind::Eip1559,
			_ => TransactionKind::Unknown,
		}
	}
}

impl fmt::Display for TransactionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// A transaction body as returned inside a block fetched with full transactions.
///
/// Every field is optional. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	#[serde(default)]
	pub hash: Option<String>,
	/// Sender
	#[serde(default)]
	pub from: Option<String>,
	/// Recipient, absent for contract creation
	#[serde(default)]
	pub to: Option<String>,
	/// Transferred value in wei
	#[serde(default)]
	pub value: Option<String>,
	/// Gas limit
	#[serde(default)]
	pub gas: Option<String>,
	#[serde(rename = "gasPrice", default)]
	pub gas_price: Option<String>,
	#[serde(rename = "maxFeePerGas", default)]
	pub max_fee_per_gas: Option<String>,
	#[serde(rename = "maxPriorityFeePerGas", default)]
	pub max_priority_fee_per_gas: Option<String>,
	/// Call data, `"0x"` when empty
	#[serde(default)]
	pub input: Option<String>,
	#[serde(rename = "type", default)]
	pub transaction_type: Option<String>,
	#[serde(default)]
	pub nonce: Option<String>,
}

impl Transaction {
	pub fn kind(&self) -> TransactionKind {
		TransactionKind::from_type_code(self.transaction_type.as_deref())
	}

	/// True when the input carries call data.
	pub fn is_contract_call(&self) -> bool {
		match self.input.as_deref() {
			Some(input) => input != "0x" && input.len() > 2,
			None => false,
		}
	}

	pub fn value(&self) -> Quantity {
		decode_optional_quantity(self.value.as_deref())
	}

	/// Price paid per gas unit: `gasPrice`, or `maxFeePerGas` when `gasPrice` decodes to zero.
	pub fn effective_gas_price(&self) -> Quantity {
		let gas_price = decode_optional_quantity(self.gas_price.as_deref());
		if !gas_price.is_zero() {
			return gas_price;
		}
		let max_fee = decode_optional_quantity(self.max_fee_per_gas.as_deref());
		Quantity {
			value: max_fee.value,
			defaulted: gas_price.defaulted || max_fee.defaulted,
		}
	}

	/// Lowercased sender, `None` when absent or empty.
	pub fn sender(&self) -> Option<String> {
		non_empty_lowercase(self.from.as_deref())
	}

	/// Lowercased recipient, `None` for contract creation.
	pub fn recipient(&self) -> Option<String> {
		non_empty_lowercase(self.to.as_deref())
	}
}

fn non_empty_lowercase(raw: Option<&str>) -> Option<String> {
	raw.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_lowercase)
}
