#![no_main]

use libfuzzer_sys::fuzz_target;
use monad_exporter::utils::hex::{decode_quantity, encode_quantity};

fuzz_target!(|data: &[u8]| {
	let raw = String::from_utf8_lossy(data);
	let decoded = decode_quantity(&raw);
	if !decoded.defaulted {
		assert_eq!(decode_quantity(&encode_quantity(decoded.value)), decoded);
	}
});
