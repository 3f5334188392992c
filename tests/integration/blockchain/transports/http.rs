use mockito::{Matcher, Server};
use serde_json::{json, Value};

use monad_exporter::{
	models::{ExporterConfig, RpcUrl},
	services::blockchain::{BlockchainTransport, HttpTransportClient},
};

fn config_with_urls(urls: Vec<RpcUrl>) -> ExporterConfig {
	ExporterConfig {
		rpc_urls: urls,
		rpc_timeout_ms: 2_000,
		..ExporterConfig::default()
	}
}

async fn probe_mock(server: &mut Server, status: usize) -> mockito::Mock {
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
		.with_status(status)
		.with_header("content-type", "application/json")
		.with_body(r#"{"jsonrpc": "2.0", "result": "0x1", "id": 1}"#)
		.create_async()
		.await
}

#[tokio::test]
async fn test_highest_weight_healthy_endpoint_becomes_active() {
	let mut low = Server::new_async().await;
	let mut high = Server::new_async().await;
	let _low_probe = probe_mock(&mut low, 200).await;
	let _high_probe = probe_mock(&mut high, 200).await;

	let config = config_with_urls(vec![
		RpcUrl::new(low.url(), 10),
		RpcUrl::new(high.url(), 90),
	]);

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, high.url());
}

#[tokio::test]
async fn test_unhealthy_endpoint_is_skipped_at_startup() {
	let mut down = Server::new_async().await;
	let mut up = Server::new_async().await;
	let _down_probe = probe_mock(&mut down, 503).await;
	let _up_probe = probe_mock(&mut up, 200).await;

	let config = config_with_urls(vec![
		RpcUrl::new(down.url(), 100),
		RpcUrl::new(up.url(), 50),
	]);

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, up.url());
}

#[tokio::test]
async fn test_falls_back_to_highest_weight_when_nothing_answers() {
	let mut first = Server::new_async().await;
	let mut second = Server::new_async().await;
	let _first_probe = probe_mock(&mut first, 500).await;
	let _second_probe = probe_mock(&mut second, 500).await;

	let config = config_with_urls(vec![
		RpcUrl::new(second.url(), 20),
		RpcUrl::new(first.url(), 80),
	]);

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, first.url());
}

#[tokio::test]
async fn test_zero_weight_endpoints_are_ignored() {
	let mut enabled = Server::new_async().await;
	let disabled = Server::new_async().await;
	let _probe = probe_mock(&mut enabled, 200).await;

	let config = config_with_urls(vec![
		RpcUrl::new(disabled.url(), 0),
		RpcUrl::new(enabled.url(), 1),
	]);

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, enabled.url());
}

#[tokio::test]
async fn test_send_raw_request_posts_envelope() {
	let mut server = Server::new_async().await;
	let _probe = probe_mock(&mut server, 200).await;

	let call = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"jsonrpc": "2.0",
			"method": "eth_getBlockByNumber",
			"params": ["0x64", true]
		})))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"{"jsonrpc": "2.0", "result": {"number": "0x64"}, "id": 1}"#)
		.expect(1)
		.create_async()
		.await;

	let config = config_with_urls(vec![RpcUrl::new(server.url(), 100)]);
	let transport = HttpTransportClient::new(&config, None).await.unwrap();

	let response = transport
		.send_raw_request("eth_getBlockByNumber", Some(json!(["0x64", true])))
		.await
		.unwrap();

	assert_eq!(response["result"]["number"], "0x64");
	call.assert();
}

#[tokio::test]
async fn test_missing_params_are_sent_as_empty_array() {
	let mut server = Server::new_async().await;
	let _probe = probe_mock(&mut server, 200).await;

	let transport =
		HttpTransportClient::new(&config_with_urls(vec![RpcUrl::new(server.url(), 100)]), None)
			.await
			.unwrap();

	let request = transport
		.customize_request::<Value>("web3_clientVersion", None)
		.await;

	assert_eq!(
		request,
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": "web3_clientVersion",
			"params": []
		})
	);
}

#[tokio::test]
async fn test_custom_probe_payload_is_used() {
	let mut server = Server::new_async().await;
	let probe = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "net_version"})))
		.with_status(200)
		.with_body(r#"{"jsonrpc": "2.0", "result": "10143", "id": 1}"#)
		.expect(1)
		.create_async()
		.await;

	let payload = r#"{"jsonrpc": "2.0", "id": 1, "method": "net_version", "params": []}"#;
	let config = config_with_urls(vec![RpcUrl::new(server.url(), 100)]);
	let transport = HttpTransportClient::new(&config, Some(payload.to_string()))
		.await
		.unwrap();

	assert_eq!(transport.get_current_url().await, server.url());
	probe.assert();
}
