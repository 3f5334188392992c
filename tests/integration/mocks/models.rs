use monad_exporter::{
	models::{Block, BlockTransaction, Transaction},
	utils::hex::encode_u64,
};

/// Builder for test blocks; every numeric field is written as hex
pub struct BlockBuilder {
	block: Block,
}

impl BlockBuilder {
	pub fn new(number: u64) -> Self {
		Self {
			block: Block {
				number: Some(encode_u64(number)),
				hash: Some(format!("0x{:064x}", number)),
				..Block::default()
			},
		}
	}

	pub fn timestamp(mut self, timestamp: u64) -> Self {
		self.block.timestamp = Some(encode_u64(timestamp));
		self
	}

	pub fn gas(mut self, used: u64, limit: u64) -> Self {
		self.block.gas_used = Some(encode_u64(used));
		self.block.gas_limit = Some(encode_u64(limit));
		self
	}

	pub fn size(mut self, size: u64) -> Self {
		self.block.size = Some(encode_u64(size));
		self
	}

	pub fn base_fee(mut self, base_fee: u64) -> Self {
		self.block.base_fee_per_gas = Some(encode_u64(base_fee));
		self
	}

	pub fn transaction(mut self, tx: Transaction) -> Self {
		self.block
			.transactions
			.push(BlockTransaction::Full(Box::new(tx)));
		self
	}

	/// Adds `count` legacy transfers with distinct senders and a shared recipient
	pub fn transfers(mut self, count: usize) -> Self {
		for i in 0..count {
			self = self.transaction(TransactionBuilder::transfer(i as u64).build());
		}
		self
	}

	pub fn build(self) -> Block {
		self.block
	}
}

/// Builder for test transactions
pub struct TransactionBuilder {
	tx: Transaction,
}

impl TransactionBuilder {
	pub fn new() -> Self {
		Self {
			tx: Transaction {
				input: Some("0x".to_string()),
				transaction_type: Some("0x0".to_string()),
				..Transaction::default()
			},
		}
	}

	/// Legacy value transfer from a sender derived from `seed`
	pub fn transfer(seed: u64) -> Self {
		Self::new()
			.from(&format!("0x{:040x}", seed + 1))
			.to("0x00000000000000000000000000000000000000ff")
			.value(1_000)
			.gas_price(100)
	}

	pub fn from(mut self, address: &str) -> Self {
		self.tx.from = Some(address.to_string());
		self
	}

	pub fn to(mut self, address: &str) -> Self {
		self.tx.to = Some(address.to_string());
		self
	}

	pub fn value(mut self, value: u64) -> Self {
		self.tx.value = Some(encode_u64(value));
		self
	}

	pub fn gas_price(mut self, price: u64) -> Self {
		self.tx.gas_price = Some(encode_u64(price));
		self
	}

	pub fn raw_gas_price(mut self, raw: &str) -> Self {
		self.tx.gas_price = Some(raw.to_string());
		self
	}

	pub fn max_fee_per_gas(mut self, raw: &str) -> Self {
		self.tx.max_fee_per_gas = Some(raw.to_string());
		self
	}

	pub fn input(mut self, input: &str) -> Self {
		self.tx.input = Some(input.to_string());
		self
	}

	pub fn kind(mut self, code: &str) -> Self {
		self.tx.transaction_type = Some(code.to_string());
		self
	}

	pub fn build(self) -> Transaction {
		self.tx
	}
}
