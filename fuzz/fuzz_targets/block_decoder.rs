#![no_main]

use libfuzzer_sys::fuzz_target;
use monad_exporter::{models::Block, services::aggregator::WindowStats};

fuzz_target!(|data: &[u8]| {
	if let Ok(block) = serde_json::from_slice::<Block>(data) {
		let mut stats = WindowStats::new();
		stats.fold_block(block.number().to_u64(), &block);
		let _ = stats.summarize(1);
	}
});
