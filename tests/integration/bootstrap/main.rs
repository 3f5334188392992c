use serde_json::{json, Value};
use std::sync::Arc;

use monad_exporter::{
	bootstrap::assemble_services,
	models::ExporterConfig,
	services::{
		blockchain::BlockFetcher,
		collector::CycleResult,
		sink::MetricsSink,
	},
};

use crate::integration::mocks::{rpc_error, rpc_result, MockRpcTransport};

fn block_json(number: u64, timestamp: u64, tx_count: usize) -> Value {
	let transactions: Vec<Value> = (0..tx_count)
		.map(|i| {
			json!({
				"hash": format!("0x{:064x}", i),
				"from": format!("0x{:040x}", i + 1),
				"to": "0x00000000000000000000000000000000000000ff",
				"value": "0x64",
				"gasPrice": "0x3b9aca00",
				"input": "0x",
				"type": "0x0"
			})
		})
		.collect();

	json!({
		"number": format!("0x{:x}", number),
		"timestamp": format!("0x{:x}", timestamp),
		"gasUsed": "0x5208",
		"gasLimit": "0xa410",
		"size": "0x400",
		"baseFeePerGas": "0x3b9aca00",
		"transactions": transactions
	})
}

/// Transport serving a small chain whose head is block 0x10
fn chain_transport() -> MockRpcTransport {
	let mut transport = MockRpcTransport::new();
	transport
		.expect_send_raw_request()
		.returning(|method, params| {
			let params = params.unwrap_or_default();
			let response = match method {
				"eth_chainId" => rpc_result(json!("0x279f")),
				"web3_clientVersion" => rpc_result(json!("Monad/v0.9.0")),
				"eth_blockNumber" => rpc_result(json!("0x10")),
				"eth_gasPrice" => rpc_result(json!("0xba43b7400")),
				"eth_maxPriorityFeePerGas" => rpc_result(json!("0x77359400")),
				"eth_getBlockByNumber" => {
					let number = params
						.first()
						.and_then(Value::as_str)
						.and_then(|tag| u64::from_str_radix(tag.trim_start_matches("0x"), 16).ok())
						.unwrap_or(0);
					rpc_result(block_json(number, 1_000 + number * 2, 4))
				}
				_ => rpc_error(-32601, "method not found"),
			};
			Ok(response)
		});
	transport
}

fn config() -> ExporterConfig {
	ExporterConfig {
		window_size: 3,
		fetch_delay_ms: 0,
		rate_limit_backoff_ms: 0,
		..ExporterConfig::default()
	}
}

#[tokio::test]
async fn test_assemble_services_runs_a_cycle() {
	let services = assemble_services(config(), chain_transport()).unwrap();

	let result = services.collector.run_cycle().await;
	assert_eq!(result, CycleResult::Success);

	let snapshot = services.store.latest().await;
	assert_eq!(snapshot.block_number, 16);
	assert_eq!(snapshot.chain.chain_id, "10143");
	assert_eq!(snapshot.gas_price_gwei, 50.0);
	assert_eq!(snapshot.max_priority_fee_per_gas_wei, 2e9);
	assert_eq!(snapshot.window_blocks_fetched, 3);
	assert_eq!(snapshot.avg_transactions_per_block, 4.0);
	assert_eq!(snapshot.avg_block_time_seconds, 2.0);
	assert_eq!(snapshot.transactions_per_second, 2.0);
	assert_eq!(snapshot.current_block.gas_utilization_percent, 50.0);

	let from_sink = services.sink.latest().await;
	assert!(Arc::ptr_eq(&snapshot, &from_sink));
}

#[tokio::test]
async fn test_shared_registry_tracks_rpc_calls() {
	let services = assemble_services(config(), chain_transport()).unwrap();

	services.collector.run_cycle().await;

	let metrics = &services.metrics;
	// chain id, client version, head, gas price, priority fee, three window blocks,
	// then the oldest and newest blocks again for block time
	assert_eq!(metrics.rpc().response_time.get_sample_count(), 10);
	assert_eq!(metrics.current_block_number.get(), 16.0);

	let text = String::from_utf8(metrics.gather().unwrap()).unwrap();
	assert!(text.contains("monad_collection_cycles_total{result=\"success\"} 1"));
}

#[tokio::test]
async fn test_fetcher_is_shared_with_the_aggregator() {
	let services = assemble_services(config(), chain_transport()).unwrap();

	let head = services.fetcher.get_block_number().await.unwrap();
	assert_eq!(head.to_u64(), 16);
	assert_eq!(services.collector.interval(), config().collection_interval());
}
