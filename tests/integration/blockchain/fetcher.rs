use mockall::predicate;
use serde_json::{json, Value};

use monad_exporter::{
	models::{BlockTag, TransactionKind},
	services::blockchain::{BlockFetcher, EvmBlockFetcher, RpcClient, RpcError},
	utils::metrics::RpcMetrics,
};

use crate::integration::mocks::{rpc_result, MockRpcTransport};

fn fetcher_returning(method: &'static str, result: Value) -> EvmBlockFetcher<MockRpcTransport> {
	fetcher_with_metrics(method, result, RpcMetrics::new().unwrap())
}

fn fetcher_with_metrics(
	method: &'static str,
	result: Value,
	metrics: RpcMetrics,
) -> EvmBlockFetcher<MockRpcTransport> {
	let mut transport = MockRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(predicate::eq(method), predicate::always())
		.times(1)
		.returning(move |_, _| Ok(rpc_result(result.clone())));

	EvmBlockFetcher::new(RpcClient::new(transport, metrics))
}

#[tokio::test]
async fn test_get_block_number() {
	let fetcher = fetcher_returning("eth_blockNumber", json!("0x1b4"));
	let head = fetcher.get_block_number().await.unwrap();
	assert_eq!(head.to_u64(), 436);
	assert!(!head.defaulted);
}

#[tokio::test]
async fn test_malformed_quantity_is_defaulted_zero() {
	let fetcher = fetcher_returning("eth_gasPrice", json!("0xnotahexvalue"));
	let price = fetcher.get_gas_price().await.unwrap();
	assert!(price.is_zero());
	assert!(price.defaulted);
}

#[tokio::test]
async fn test_bare_prefix_is_zero() {
	let fetcher = fetcher_returning("eth_maxPriorityFeePerGas", json!("0x"));
	let fee = fetcher.get_max_priority_fee_per_gas().await.unwrap();
	assert!(fee.is_zero());
	assert!(!fee.defaulted);
}

#[tokio::test]
async fn test_numeric_result_of_wrong_type_is_decode_error() {
	let fetcher = fetcher_returning("eth_chainId", json!(10143));
	let err = fetcher.get_chain_id().await.unwrap_err();
	assert!(matches!(err, RpcError::Decode(_)));
}

#[tokio::test]
async fn test_get_client_version() {
	let fetcher = fetcher_returning("web3_clientVersion", json!("Monad/v0.9.0"));
	assert_eq!(fetcher.get_client_version().await.unwrap(), "Monad/v0.9.0");
}

#[tokio::test]
async fn test_get_block_sends_tag_and_flag() {
	let mut transport = MockRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(
			predicate::eq("eth_getBlockByNumber"),
			predicate::eq(Some(vec![json!("0x64"), json!(true)])),
		)
		.times(1)
		.returning(|_, _| {
			Ok(rpc_result(json!({
				"number": "0x64",
				"timestamp": "0x6553f100",
				"gasUsed": "0x5208",
				"gasLimit": "0x1c9c380",
				"size": "0x2a0",
				"baseFeePerGas": "0x3b9aca00",
				"transactions": [{
					"hash": "0x01",
					"from": "0xAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAaAa",
					"to": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
					"value": "0xde0b6b3a7640000",
					"gasPrice": "0x3b9aca00",
					"input": "0x",
					"type": "0x2"
				}]
			})))
		});

	let fetcher = EvmBlockFetcher::new(RpcClient::new(transport, RpcMetrics::new().unwrap()));
	let block = fetcher.get_block(BlockTag::Number(100), true).await.unwrap();

	assert_eq!(block.number().to_u64(), 100);
	assert_eq!(block.gas_used().to_u64(), 21_000);
	assert_eq!(block.gas_limit().to_u64(), 30_000_000);
	assert_eq!(block.base_fee_per_gas().to_u64(), 1_000_000_000);

	let tx = block.full_transactions().next().unwrap();
	assert_eq!(tx.kind(), TransactionKind::Eip1559);
	assert_eq!(
		tx.sender().as_deref(),
		Some("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
	);
	assert!(!tx.is_contract_call());
}

#[tokio::test]
async fn test_get_latest_block_with_hashes() {
	let mut transport = MockRpcTransport::new();
	transport
		.expect_send_raw_request()
		.with(
			predicate::eq("eth_getBlockByNumber"),
			predicate::eq(Some(vec![json!("latest"), json!(false)])),
		)
		.times(1)
		.returning(|_, _| {
			Ok(rpc_result(json!({
				"number": "0x10",
				"transactions": ["0x01", "0x02"]
			})))
		});

	let fetcher = EvmBlockFetcher::new(RpcClient::new(transport, RpcMetrics::new().unwrap()));
	let block = fetcher.get_block(BlockTag::Latest, false).await.unwrap();

	assert_eq!(block.transaction_count(), 2);
	assert_eq!(block.full_transactions().count(), 0);
}

#[tokio::test]
async fn test_null_block_is_decode_error() {
	let fetcher = fetcher_returning("eth_getBlockByNumber", Value::Null);
	let err = fetcher
		.get_block(BlockTag::Number(1_000_000), true)
		.await
		.unwrap_err();

	assert!(matches!(err, RpcError::Decode(_)));
	assert!(err.to_string().contains("block=1000000"));
}

#[tokio::test]
async fn test_block_with_invalid_transactions_is_decode_error() {
	let fetcher = fetcher_returning(
		"eth_getBlockByNumber",
		json!({"number": "0x1", "transactions": [7, 8]}),
	);
	let err = fetcher.get_block(BlockTag::Number(1), true).await.unwrap_err();
	assert!(matches!(err, RpcError::Decode(_)));
}

#[tokio::test]
async fn test_null_block_counts_as_failed_call() {
	let metrics = RpcMetrics::new().unwrap();
	let fetcher = fetcher_with_metrics("eth_getBlockByNumber", Value::Null, metrics.clone());

	fetcher.get_block(BlockTag::Number(5), true).await.unwrap_err();

	let errors = metrics.errors.with_label_values(&["eth_getBlockByNumber"]).get();
	assert_eq!(errors, 1);
	assert_eq!(metrics.response_time.get_sample_count(), 1);
}

#[tokio::test]
async fn test_wrong_result_type_counts_as_failed_call() {
	let metrics = RpcMetrics::new().unwrap();
	let fetcher = fetcher_with_metrics("web3_clientVersion", json!(42), metrics.clone());

	let err = fetcher.get_client_version().await.unwrap_err();

	assert!(matches!(err, RpcError::Decode(_)));
	assert_eq!(metrics.errors.with_label_values(&["web3_clientVersion"]).get(), 1);
}

#[tokio::test]
async fn test_successful_decode_counts_no_error() {
	let metrics = RpcMetrics::new().unwrap();
	let fetcher = fetcher_with_metrics("eth_gasPrice", json!("0x3b9aca00"), metrics.clone());

	assert_eq!(fetcher.get_gas_price().await.unwrap().to_u64(), 1_000_000_000);
	assert_eq!(metrics.errors.with_label_values(&["eth_gasPrice"]).get(), 0);
}
