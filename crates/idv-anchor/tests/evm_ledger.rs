//! Contract tests for the EVM JSON-RPC ledger binding, with a wiremock
//! server standing in for the node.
//!
//! ## Methods Exercised
//!
//! | JSON-RPC method | Registry function | Test |
//! |---|---|---|
//! | `eth_call` | `getCredentialOwner` | `get_owner_*` |
//! | `eth_call` | `verifyCredential` | `query_*` |
//! | `eth_sendTransaction` + `eth_getTransactionReceipt` | `storeCredential` | `submit_*` |
//! | `eth_sendTransaction` + `eth_getTransactionReceipt` | `revokeCredential` | `revoke_*` |

use std::sync::Arc;
use std::time::Duration;

use idv_anchor::{
    AnchorAdapter, AnchorError, EvmLedger, EvmLedgerConfig, RetryPolicy, SubmissionMode,
};
use idv_core::{CredentialType, OwnerAddress};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTRACT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const SIGNER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
const OWNER: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";
const DIGEST: &str = "786991c584f2b95641bce4f987a33fdbf8d9aaee4a3708a0e5d11210c3d35fdd";
const TX: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

fn owner() -> OwnerAddress {
    OwnerAddress::parse(OWNER).unwrap()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
    }
}

fn ledger_config(server: &MockServer) -> EvmLedgerConfig {
    EvmLedgerConfig::new(
        Url::parse(&server.uri()).unwrap(),
        OwnerAddress::parse(CONTRACT).unwrap(),
    )
    .with_signer(OwnerAddress::parse(SIGNER).unwrap())
    .with_receipt_polling(3, Duration::from_millis(1))
}

fn adapter(server: &MockServer) -> AnchorAdapter {
    let ledger = EvmLedger::new(ledger_config(server)).unwrap();
    AnchorAdapter::new(Arc::new(ledger), SubmissionMode::Live, "Ethereum").with_retry(fast_retry())
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn address_word(addr: &str) -> String {
    format!("0x{}{}", "0".repeat(24), addr.trim_start_matches("0x").to_lowercase())
}

fn bool_word(value: bool) -> String {
    format!("0x{}{}", "0".repeat(63), if value { "1" } else { "0" })
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ── getCredentialOwner ──────────────────────────────────────────────

#[tokio::test]
async fn get_owner_returns_recorded_owner() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!(address_word(OWNER)))).await;

    let found = adapter(&server).get_owner(DIGEST).await.unwrap();
    assert_eq!(found, Some(owner()));

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let call = &bodies[0]["params"][0];
    assert_eq!(call["to"], CONTRACT.to_lowercase());
    assert_eq!(call["data"], format!("0x47eaa26d{DIGEST}"));
    assert_eq!(bodies[0]["params"][1], "latest");
}

#[tokio::test]
async fn get_owner_zero_address_is_none() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_call",
        rpc_result(json!(address_word("0x0000000000000000000000000000000000000000"))),
    )
    .await;

    assert_eq!(adapter(&server).get_owner(DIGEST).await.unwrap(), None);
}

#[tokio::test]
async fn get_owner_short_digest_is_right_padded_on_the_wire() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!(address_word(OWNER)))).await;

    adapter(&server).get_owner("0xabcd").await.unwrap();

    let bodies = request_bodies(&server).await;
    let expected = format!("0x47eaa26dabcd{}", "0".repeat(60));
    assert_eq!(bodies[0]["params"][0]["data"], expected);
}

#[tokio::test]
async fn get_owner_retries_transport_errors_then_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = adapter(&server).get_owner(DIGEST).await.unwrap_err();
    assert!(matches!(err, AnchorError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn json_rpc_error_is_rejected_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "execution reverted"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server).get_owner(DIGEST).await.unwrap_err();
    match err {
        AnchorError::Rejected(msg) => assert!(msg.contains("execution reverted")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_call_result_is_rejected() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!("0x"))).await;

    assert!(matches!(
        adapter(&server).get_owner(DIGEST).await,
        Err(AnchorError::Rejected(_))
    ));
}

// ── verifyCredential ────────────────────────────────────────────────

#[tokio::test]
async fn query_decodes_bool() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!(bool_word(true)))).await;

    assert!(adapter(&server).query(&owner(), DIGEST).await.unwrap());

    let bodies = request_bodies(&server).await;
    let data = bodies[0]["params"][0]["data"].as_str().unwrap().to_string();
    assert!(data.starts_with("0x5f889e17"));
    assert_eq!(data.len(), 2 + 8 + 128);
    assert!(data.ends_with(DIGEST));
}

#[tokio::test]
async fn query_false_for_unknown_credential() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!(bool_word(false)))).await;

    assert!(!adapter(&server).query(&owner(), DIGEST).await.unwrap());
}

// ── storeCredential ─────────────────────────────────────────────────

#[tokio::test]
async fn submit_sends_transaction_and_reads_receipt() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({
            "transactionHash": TX,
            "blockNumber": "0x10",
            "gasUsed": "0x1d4c0",
            "status": "0x1"
        })),
    )
    .await;

    let ty = CredentialType::new("passport").unwrap();
    let receipt = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap();
    assert_eq!(receipt.transaction_id, TX);
    assert_eq!(receipt.block_number, 16);
    assert_eq!(receipt.gas_used, 120_000);
    assert_eq!(receipt.status_code, 1);
    assert!(!receipt.simulated);

    let bodies = request_bodies(&server).await;
    let tx = &bodies[0]["params"][0];
    assert_eq!(bodies[0]["method"], "eth_sendTransaction");
    assert_eq!(tx["from"], SIGNER.to_lowercase());
    assert_eq!(tx["to"], CONTRACT.to_lowercase());
    assert_eq!(tx["gas"], "0x2dc6c0");
    assert!(tx["data"].as_str().unwrap().starts_with("0x1e323f56"));
}

#[tokio::test]
async fn submit_polls_until_receipt_appears() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    // First poll: still pending.
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"blockNumber": "0x2", "gasUsed": "0x5208", "status": "0x1"})),
    )
    .await;

    let ty = CredentialType::new("aadhar").unwrap();
    let receipt = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap();
    assert_eq!(receipt.block_number, 2);
    assert_eq!(receipt.gas_used, 21_000);
}

#[tokio::test]
async fn submit_keeps_polling_through_receipt_poll_failure() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"blockNumber": "0x9", "gasUsed": "0x5208", "status": "0x1"})),
    )
    .await;

    let ty = CredentialType::new("passport").unwrap();
    let receipt = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap();
    assert_eq!(receipt.block_number, 9);
    assert!(!receipt.simulated);
}

#[tokio::test]
async fn submit_gives_up_when_every_receipt_poll_fails() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let ty = CredentialType::new("passport").unwrap();
    match adapter(&server).submit(&owner(), DIGEST, &ty).await {
        Err(AnchorError::Transport(msg)) => assert!(msg.contains("HTTP 503")),
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_reverted_transaction_is_rejected() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"blockNumber": "0x3", "gasUsed": "0x5208", "status": "0x0"})),
    )
    .await;

    let ty = CredentialType::new("passport").unwrap();
    let err = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap_err();
    assert!(matches!(err, AnchorError::Rejected(_)));
}

#[tokio::test]
async fn submit_gives_up_when_never_mined() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(Value::Null))
        .expect(3)
        .mount(&server)
        .await;

    let ty = CredentialType::new("passport").unwrap();
    let err = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap_err();
    assert!(matches!(err, AnchorError::Transport(_)));
}

#[tokio::test]
async fn submit_transport_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let ty = CredentialType::new("passport").unwrap();
    let err = adapter(&server).submit(&owner(), DIGEST, &ty).await.unwrap_err();
    assert!(matches!(err, AnchorError::Transport(_)));
}

#[tokio::test]
async fn simulated_submit_sends_nothing() {
    let server = MockServer::start().await;
    let ledger = EvmLedger::new(ledger_config(&server)).unwrap();
    let adapter = AnchorAdapter::new(Arc::new(ledger), SubmissionMode::Simulated, "Ethereum");

    let ty = CredentialType::new("passport").unwrap();
    let receipt = adapter.submit(&owner(), DIGEST, &ty).await.unwrap();
    assert!(receipt.simulated);
    assert!(request_bodies(&server).await.is_empty());
}

// ── revokeCredential ────────────────────────────────────────────────

#[tokio::test]
async fn revoke_sends_revoke_calldata() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_result(json!(TX))).await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"blockNumber": "0x4", "gasUsed": "0x7530", "status": "0x1"})),
    )
    .await;

    let receipt = adapter(&server).revoke(&owner(), DIGEST).await.unwrap();
    assert_eq!(receipt.gas_used, 30_000);

    let bodies = request_bodies(&server).await;
    let data = bodies[0]["params"][0]["data"].as_str().unwrap().to_string();
    assert!(data.starts_with("0xe5dca78e"));
}

// ── binding policy ──────────────────────────────────────────────────

#[tokio::test]
async fn zero_contract_never_contacts_node() {
    let server = MockServer::start().await;
    let mut config = ledger_config(&server);
    config.contract_address = OwnerAddress::ZERO;
    let ledger = EvmLedger::new(config).unwrap();
    let adapter = AnchorAdapter::new(Arc::new(ledger), SubmissionMode::Live, "Ethereum");

    assert!(!adapter.is_bound());
    assert!(matches!(
        adapter.get_owner(DIGEST).await,
        Err(AnchorError::Unavailable(_))
    ));
    assert!(request_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn unreachable_node_is_transport_error() {
    let config = EvmLedgerConfig::new(
        Url::parse("http://127.0.0.1:1").unwrap(),
        OwnerAddress::parse(CONTRACT).unwrap(),
    );
    let ledger = EvmLedger::new(config).unwrap();
    let adapter = AnchorAdapter::new(Arc::new(ledger), SubmissionMode::Simulated, "Ethereum")
        .with_retry(RetryPolicy::none());

    assert!(matches!(
        adapter.get_owner(DIGEST).await,
        Err(AnchorError::Transport(_))
    ));
}
