use std::{sync::Arc, time::Duration};

use monad_exporter::{
	models::{ChainSnapshot, TransactionKind},
	services::aggregator::{
		AggregatorConfig, AggregatorError, CycleIssue, WindowAggregator, WindowAggregatorTrait,
	},
};

use crate::integration::mocks::{BlockBuilder, ChainFixture, TransactionBuilder};

fn config(window_size: u64) -> AggregatorConfig {
	AggregatorConfig {
		network: "monad-testnet".to_string(),
		window_size,
		fetch_delay: Duration::ZERO,
		rate_limit_backoff: Duration::ZERO,
		per_block_series: false,
	}
}

fn aggregator(fixture: ChainFixture, config: AggregatorConfig) -> impl WindowAggregatorTrait {
	WindowAggregator::new(Arc::new(fixture.into_fetcher()), config)
}

fn assert_close(actual: f64, expected: f64) {
	assert!(
		(actual - expected).abs() < 1e-9,
		"expected {}, got {}",
		expected,
		actual
	);
}

/// Blocks 100, 99 and 98 with 2, 0 and 1 transfers at 50, 0 and 25 gas out of 100.
fn three_block_chain() -> ChainFixture {
	ChainFixture::new(100)
		.block(
			BlockBuilder::new(100)
				.timestamp(1_002)
				.gas(50, 100)
				.size(1_024)
				.base_fee(1_000_000_000)
				.transfers(2)
				.build(),
		)
		.block(BlockBuilder::new(99).timestamp(1_001).gas(0, 100).build())
		.block(
			BlockBuilder::new(98)
				.timestamp(1_000)
				.gas(25, 100)
				.transfers(1)
				.build(),
		)
}

#[tokio::test]
async fn test_full_window_averages() {
	let report = aggregator(three_block_chain(), config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap();

	assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
	let snapshot = report.snapshot;

	assert_eq!(snapshot.block_number, 100);
	assert_eq!(snapshot.window_blocks_fetched, 3);
	assert_close(snapshot.avg_transactions_per_block, 1.0);
	assert_close(snapshot.avg_gas_utilization_percent, 25.0);
	assert_close(snapshot.avg_block_time_seconds, 1.0);
	assert_close(snapshot.transactions_per_second, 1.0);
	assert!(!snapshot.updated_at.is_empty());
}

#[tokio::test]
async fn test_head_block_fills_current_block() {
	let snapshot = aggregator(three_block_chain(), config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	let current = &snapshot.current_block;
	assert_close(current.gas_used, 50.0);
	assert_close(current.gas_limit, 100.0);
	assert_close(current.gas_utilization_percent, 50.0);
	assert_close(current.size_bytes, 1_024.0);
	assert_eq!(current.transaction_count, 2);
	assert_close(current.base_fee_per_gas_wei, 1e9);
	assert_eq!(current.timestamp, 1_002);
}

#[tokio::test]
async fn test_chain_metadata_and_gas_price() {
	let snapshot = aggregator(three_block_chain(), config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	assert_eq!(snapshot.chain.chain_id, "10143");
	assert_eq!(snapshot.chain.client_version, "Monad/v0.9.0");
	assert_eq!(snapshot.chain.network, "monad-testnet");
	assert_close(snapshot.gas_price_wei, 50e9);
	assert_close(snapshot.gas_price_gwei, 50.0);
	assert_close(snapshot.max_priority_fee_per_gas_wei, 2e9);
}

#[tokio::test]
async fn test_skipped_block_still_divides_by_window_size() {
	let fixture = three_block_chain().throttle(99);

	let report = aggregator(fixture, config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap();

	assert!(report.is_partial());
	assert!(report.issues.iter().any(|issue| matches!(
		issue,
		CycleIssue::BlockSkipped {
			number: 99,
			rate_limited: true,
			..
		}
	)));
	assert!(!report.issues.contains(&CycleIssue::CurrentBlockUnavailable));

	let snapshot = report.snapshot;
	assert_eq!(snapshot.window_blocks_fetched, 2);
	assert_close(snapshot.avg_transactions_per_block, 1.0);
	assert_close(snapshot.avg_gas_utilization_percent, 37.5);
}

#[tokio::test]
async fn test_skipped_head_block_keeps_previous_current_block() {
	let previous = ChainSnapshot {
		current_block: monad_exporter::models::CurrentBlock {
			gas_used: 7.0,
			timestamp: 900,
			..Default::default()
		},
		..ChainSnapshot::default()
	};

	let fixture = ChainFixture::new(100)
		.block(BlockBuilder::new(99).timestamp(1_000).gas(10, 100).build())
		.block(BlockBuilder::new(98).timestamp(998).gas(10, 100).build());

	let report = aggregator(fixture, config(3))
		.collect(&previous)
		.await
		.unwrap();

	assert!(report.issues.contains(&CycleIssue::CurrentBlockUnavailable));
	assert!(report.issues.iter().any(|issue| matches!(
		issue,
		CycleIssue::BlockSkipped {
			number: 100,
			rate_limited: false,
			..
		}
	)));
	assert_eq!(report.snapshot.current_block, previous.current_block);
	assert_eq!(report.snapshot.window_blocks_fetched, 2);
}

#[tokio::test]
async fn test_zero_legacy_price_uses_max_fee() {
	let tx = TransactionBuilder::new()
		.from("0x1111111111111111111111111111111111111111")
		.to("0x2222222222222222222222222222222222222222")
		.raw_gas_price("0x0")
		.max_fee_per_gas("0x3b9aca00")
		.kind("0x2")
		.build();

	let fixture = ChainFixture::new(5).block(
		BlockBuilder::new(5)
			.timestamp(100)
			.gas(21_000, 30_000_000)
			.transaction(tx)
			.build(),
	);

	let snapshot = aggregator(fixture, config(1))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	assert_close(snapshot.avg_gas_price_wei, 1e9);
	assert_eq!(snapshot.transaction_kinds[&TransactionKind::Eip1559], 1);
}

#[tokio::test]
async fn test_block_time_and_throughput() {
	let mut fixture = ChainFixture::new(103);
	for (number, timestamp) in [(103, 1_030), (102, 1_020), (101, 1_010), (100, 1_000)] {
		fixture = fixture.block(
			BlockBuilder::new(number)
				.timestamp(timestamp)
				.gas(1, 2)
				.transfers(2)
				.build(),
		);
	}

	let snapshot = aggregator(fixture, config(4))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	assert_close(snapshot.avg_block_time_seconds, 10.0);
	assert_close(snapshot.avg_transactions_per_block, 2.0);
	assert_close(snapshot.transactions_per_second, 0.2);
}

#[tokio::test]
async fn test_non_increasing_timestamps_keep_previous_block_time() {
	let previous = ChainSnapshot {
		avg_block_time_seconds: 0.5,
		transactions_per_second: 4.0,
		..ChainSnapshot::default()
	};

	let fixture = ChainFixture::new(11)
		.block(BlockBuilder::new(11).timestamp(500).transfers(1).build())
		.block(BlockBuilder::new(10).timestamp(500).transfers(1).build());

	let report = aggregator(fixture, config(2))
		.collect(&previous)
		.await
		.unwrap();

	assert!(report.issues.is_empty());
	assert_close(report.snapshot.avg_block_time_seconds, 0.5);
	assert_close(report.snapshot.transactions_per_second, 4.0);
}

#[tokio::test]
async fn test_window_stops_at_genesis() {
	let fixture = ChainFixture::new(1)
		.block(BlockBuilder::new(1).timestamp(2).gas(10, 100).build())
		.block(BlockBuilder::new(0).timestamp(0).gas(0, 100).build());

	let report = aggregator(fixture, config(5))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap();

	assert!(report.issues.is_empty());
	assert_eq!(report.snapshot.window_blocks_fetched, 2);
	assert_close(report.snapshot.avg_block_time_seconds, 2.0);
}

#[tokio::test]
async fn test_zero_gas_limit_keeps_previous_utilization() {
	let previous = ChainSnapshot {
		avg_gas_utilization_percent: 42.0,
		avg_gas_price_wei: 3e9,
		..ChainSnapshot::default()
	};

	let fixture = ChainFixture::new(3).block(BlockBuilder::new(3).timestamp(10).build());

	let snapshot = aggregator(fixture, config(1))
		.collect(&previous)
		.await
		.unwrap()
		.snapshot;

	assert_close(snapshot.avg_gas_utilization_percent, 42.0);
	assert_close(snapshot.avg_gas_price_wei, 3e9);
	assert_close(snapshot.current_block.gas_utilization_percent, 0.0);
}

#[tokio::test]
async fn test_unique_addresses_and_transaction_classes() {
	let call = TransactionBuilder::transfer(0)
		.input("0xa9059cbb")
		.kind("0x1")
		.build();

	let fixture = ChainFixture::new(8)
		.block(
			BlockBuilder::new(8)
				.timestamp(20)
				.transfers(2)
				.transaction(call)
				.build(),
		)
		.block(BlockBuilder::new(7).timestamp(10).transfers(1).build());

	let snapshot = aggregator(fixture, config(2))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	// Block 8: two distinct senders plus the shared recipient. Block 7: one sender and
	// the recipient.
	assert_close(snapshot.avg_unique_addresses_per_block, 2.5);
	assert_eq!(snapshot.contract_calls, 1);
	assert_eq!(snapshot.simple_transfers, 3);
	assert_eq!(snapshot.transaction_kinds[&TransactionKind::Legacy], 3);
	assert_eq!(snapshot.transaction_kinds[&TransactionKind::Eip2930], 1);
	assert_eq!(snapshot.transaction_kinds[&TransactionKind::Unknown], 0);
	assert_close(snapshot.total_value_transferred_wei, 4_000.0);
}

#[tokio::test]
async fn test_per_block_series_are_kept_only_when_enabled() {
	let disabled = aggregator(three_block_chain(), config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;
	assert!(disabled.blocks.is_empty());

	let enabled_config = AggregatorConfig {
		per_block_series: true,
		..config(3)
	};
	let enabled = aggregator(three_block_chain(), enabled_config)
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	let numbers: Vec<u64> = enabled.blocks.iter().map(|b| b.number).collect();
	assert_eq!(numbers, vec![100, 99, 98]);
	assert_close(enabled.blocks[2].gas_utilization_percent, 25.0);
	assert_eq!(enabled.blocks[0].transaction_count, 2);
}

#[tokio::test]
async fn test_per_block_series_label_requested_height() {
	let mut fixture = three_block_chain();
	let mut unnumbered = BlockBuilder::new(99).timestamp(1_001).gas(10, 100).build();
	unnumbered.number = None;
	fixture.blocks.insert(99, unnumbered);

	let config = AggregatorConfig {
		per_block_series: true,
		..config(3)
	};
	let snapshot = aggregator(fixture, config)
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	let numbers: Vec<u64> = snapshot.blocks.iter().map(|b| b.number).collect();
	assert_eq!(numbers, vec![100, 99, 98]);
	assert_close(snapshot.blocks[1].gas_utilization_percent, 10.0);
}

#[tokio::test]
async fn test_head_failure_aborts_cycle() {
	let mut fixture = three_block_chain();
	fixture.head_fails = true;

	let err = aggregator(fixture, config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap_err();

	assert!(matches!(err, AggregatorError::HeadUnavailable(_)));
	assert!(err.rpc_error().is_some());
}

#[tokio::test]
async fn test_gas_price_failure_aborts_cycle() {
	let mut fixture = three_block_chain();
	fixture.gas_price_fails = true;

	let err = aggregator(fixture, config(3))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap_err();

	assert!(matches!(err, AggregatorError::GasPriceUnavailable(_)));
	assert!(err.rpc_error().map(|e| e.is_rate_limited()).unwrap_or(false));
}

#[tokio::test]
async fn test_optional_metadata_failures_are_partial() {
	let previous = ChainSnapshot {
		chain: monad_exporter::models::ChainInfo {
			chain_id: "10143".to_string(),
			..Default::default()
		},
		max_priority_fee_per_gas_wei: 1e9,
		..ChainSnapshot::default()
	};

	let mut fixture = three_block_chain();
	fixture.chain_id_fails = true;
	fixture.priority_fee_fails = true;

	let report = aggregator(fixture, config(3))
		.collect(&previous)
		.await
		.unwrap();

	assert!(report
		.issues
		.iter()
		.any(|issue| matches!(issue, CycleIssue::ChainIdUnavailable(_))));
	assert!(report
		.issues
		.iter()
		.any(|issue| matches!(issue, CycleIssue::PriorityFeeUnavailable(_))));
	assert_eq!(report.snapshot.chain.chain_id, "10143");
	assert_close(report.snapshot.max_priority_fee_per_gas_wei, 1e9);
	assert_eq!(report.snapshot.block_number, 100);
}

#[tokio::test]
async fn test_malformed_quantities_are_counted() {
	let mut block = BlockBuilder::new(4).timestamp(10).gas(10, 100).build();
	block.size = Some("0xnothex".to_string());

	let fixture = ChainFixture::new(4).block(block);

	let snapshot = aggregator(fixture, config(1))
		.collect(&ChainSnapshot::default())
		.await
		.unwrap()
		.snapshot;

	assert_eq!(snapshot.decode_defaulted_quantities, 1);
	assert_close(snapshot.current_block.size_bytes, 0.0);
}

fn paced_config() -> AggregatorConfig {
	AggregatorConfig {
		fetch_delay: Duration::from_millis(100),
		rate_limit_backoff: Duration::from_millis(500),
		..config(3)
	}
}

#[tokio::test(start_paused = true)]
async fn test_throttled_block_adds_backoff_to_fetch_delay() {
	let aggregator = aggregator(three_block_chain().throttle(99), paced_config());

	let started = tokio::time::Instant::now();
	let report = aggregator.collect(&ChainSnapshot::default()).await.unwrap();
	let elapsed = started.elapsed();

	assert_eq!(report.snapshot.window_blocks_fetched, 2);
	// two steady delays between three fetches plus one backoff after block 99
	assert!(elapsed >= Duration::from_millis(700), "elapsed {:?}", elapsed);
	assert!(elapsed < Duration::from_millis(750), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_plain_skip_waits_only_the_fetch_delay() {
	let fixture = ChainFixture::new(100)
		.block(BlockBuilder::new(100).timestamp(1_002).gas(50, 100).build())
		.block(BlockBuilder::new(98).timestamp(1_000).gas(25, 100).build());
	let aggregator = aggregator(fixture, paced_config());

	let started = tokio::time::Instant::now();
	let report = aggregator.collect(&ChainSnapshot::default()).await.unwrap();
	let elapsed = started.elapsed();

	assert!(report.issues.iter().any(|issue| matches!(
		issue,
		CycleIssue::BlockSkipped {
			number: 99,
			rate_limited: false,
			..
		}
	)));
	assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
	assert!(elapsed < Duration::from_millis(250), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_single_block_window_does_not_pause() {
	let config = AggregatorConfig {
		window_size: 1,
		..paced_config()
	};
	let aggregator = aggregator(three_block_chain(), config);

	let started = tokio::time::Instant::now();
	aggregator.collect(&ChainSnapshot::default()).await.unwrap();

	assert!(started.elapsed() < Duration::from_millis(50));
}
