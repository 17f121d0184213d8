//! # EVM JSON-RPC Ledger
//!
//! Binding to a deployed credential registry on an EVM-compatible chain.
//!
//! ## How It Works
//!
//! 1. Reads (`verifyCredential`, `getCredentialOwner`) go through `eth_call`
//!    against the `latest` block.
//! 2. Writes (`storeCredential`, `revokeCredential`) go through
//!    `eth_sendTransaction` from the configured signer account. The node
//!    signs: the account must be unlocked or managed by the RPC provider's
//!    key service.
//! 3. After sending, the receipt is polled with `eth_getTransactionReceipt`
//!    until it appears or the poll budget runs out. Status `0x0` means the
//!    contract reverted and is reported as `Rejected`.
//!
//! ## Security
//!
//! - This binding does NOT hold private keys.
//! - The signer account must be funded for gas.

use std::time::Duration;

use async_trait::async_trait;
use idv_core::{CredentialType, OwnerAddress};
use serde_json::{json, Value};
use url::Url;

use super::Ledger;
use crate::error::AnchorError;
use crate::receipt::AnchorReceipt;
use crate::wire;

/// Configuration for the EVM JSON-RPC ledger.
#[derive(Debug, Clone)]
pub struct EvmLedgerConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Registry contract. The zero address leaves the binding unbound.
    pub contract_address: OwnerAddress,
    /// Account whose transactions the node signs. `None` makes the binding
    /// read-only.
    pub signer_address: Option<OwnerAddress>,
    /// Gas limit sent with every transaction.
    pub gas_limit: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// How many times to poll for a receipt after sending.
    pub receipt_polls: u32,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
}

impl EvmLedgerConfig {
    /// Defaults: 3,000,000 gas, 30s timeout, 20 receipt polls one second apart.
    pub fn new(rpc_url: Url, contract_address: OwnerAddress) -> Self {
        Self {
            rpc_url,
            contract_address,
            signer_address: None,
            gas_limit: 3_000_000,
            timeout_secs: 30,
            receipt_polls: 20,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Set the signer account.
    pub fn with_signer(mut self, signer: OwnerAddress) -> Self {
        self.signer_address = signer.non_zero();
        self
    }

    /// Set the receipt poll budget.
    pub fn with_receipt_polling(mut self, polls: u32, interval: Duration) -> Self {
        self.receipt_polls = polls;
        self.poll_interval = interval;
        self
    }
}

/// Registry binding over Ethereum JSON-RPC.
#[derive(Debug)]
pub struct EvmLedger {
    client: reqwest::Client,
    config: EvmLedgerConfig,
}

impl EvmLedger {
    /// Build the HTTP client for `config`.
    pub fn new(config: EvmLedgerConfig) -> Result<Self, AnchorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnchorError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The configuration this binding was built from.
    pub fn config(&self) -> &EvmLedgerConfig {
        &self.config
    }

    fn bound_contract(&self) -> Result<OwnerAddress, AnchorError> {
        self.contract_address().ok_or_else(|| {
            AnchorError::Unavailable("contract address not configured".to_string())
        })
    }

    fn signer(&self) -> Result<OwnerAddress, AnchorError> {
        self.config
            .signer_address
            .ok_or_else(|| AnchorError::Unavailable("no signer account configured".to_string()))
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, AnchorError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(self.config.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnchorError::Transport(format!("{method}: request timed out"))
                } else {
                    AnchorError::Transport(format!("{method}: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(AnchorError::Transport(format!(
                "{method}: HTTP {}",
                resp.status()
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AnchorError::Transport(format!("{method}: invalid JSON response: {e}")))?;

        if let Some(error) = json.get("error") {
            let msg = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error");
            return Err(AnchorError::Rejected(format!("{method}: {msg}")));
        }

        json.get("result").cloned().ok_or_else(|| {
            AnchorError::Transport(format!("{method}: response missing 'result' field"))
        })
    }

    /// `eth_call` against the latest block, returning the raw return data.
    async fn call(&self, data: Vec<u8>) -> Result<Vec<u8>, AnchorError> {
        let contract = self.bound_contract()?;
        let call = json!({
            "to": contract.to_lower_hex(),
            "data": wire::to_0x_hex(&data),
        });
        let result = self.rpc_call("eth_call", json!([call, "latest"])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| AnchorError::Rejected("eth_call returned non-string result".into()))?;
        wire::decode_0x_hex(hex)
    }

    /// Send a transaction and wait for its receipt.
    async fn transact(&self, data: Vec<u8>) -> Result<AnchorReceipt, AnchorError> {
        let contract = self.bound_contract()?;
        let from = self.signer()?;
        let tx = json!({
            "from": from.to_lower_hex(),
            "to": contract.to_lower_hex(),
            "data": wire::to_0x_hex(&data),
            "gas": format!("0x{:x}", self.config.gas_limit),
        });

        let result = self.rpc_call("eth_sendTransaction", json!([tx])).await?;
        let tx_hash = result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AnchorError::Rejected("eth_sendTransaction returned non-string result".into())
            })?;
        tracing::debug!(tx = %tx_hash, "transaction sent, awaiting receipt");

        self.await_receipt(&tx_hash).await
    }

    /// Poll for the receipt of a sent transaction. Transient poll failures
    /// use up a poll but do not end the wait.
    async fn await_receipt(&self, tx_hash: &str) -> Result<AnchorReceipt, AnchorError> {
        let polls = self.config.receipt_polls.max(1);
        let mut last_error = None;
        for poll in 0..polls {
            if poll > 0 {
                tokio::time::sleep(self.config.poll_interval).await;
            }
            match self
                .rpc_call("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(receipt) if receipt.is_null() => continue,
                Ok(receipt) => return parse_receipt(tx_hash, &receipt),
                Err(e) if e.is_transient() => {
                    tracing::warn!(tx = tx_hash, poll, "receipt poll failed: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AnchorError::Transport(match last_error {
            Some(e) => format!("transaction {tx_hash} not mined after {polls} polls, last poll: {e}"),
            None => format!("transaction {tx_hash} not mined after {polls} polls"),
        }))
    }
}

fn parse_quantity(receipt: &Value, field: &str) -> Result<u64, AnchorError> {
    let raw = receipt
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AnchorError::Rejected(format!("receipt missing '{field}'")))?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| AnchorError::Rejected(format!("receipt '{field}' = {raw:?}: {e}")))
}

fn parse_receipt(tx_hash: &str, receipt: &Value) -> Result<AnchorReceipt, AnchorError> {
    let status = parse_quantity(receipt, "status")?;
    if status == 0 {
        return Err(AnchorError::Rejected(format!(
            "transaction {tx_hash} reverted"
        )));
    }
    Ok(AnchorReceipt {
        transaction_id: tx_hash.to_string(),
        block_number: parse_quantity(receipt, "blockNumber")?,
        gas_used: parse_quantity(receipt, "gasUsed")?,
        status_code: 1,
        simulated: false,
    })
}

#[async_trait]
impl Ledger for EvmLedger {
    fn contract_address(&self) -> Option<OwnerAddress> {
        self.config.contract_address.non_zero()
    }

    fn can_sign(&self) -> bool {
        self.config.signer_address.is_some()
    }

    async fn store_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
        credential_type: &CredentialType,
    ) -> Result<AnchorReceipt, AnchorError> {
        self.transact(wire::encode_store_credential(owner, hash, credential_type))
            .await
    }

    async fn revoke_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<AnchorReceipt, AnchorError> {
        self.transact(wire::encode_revoke_credential(owner, hash))
            .await
    }

    async fn verify_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<bool, AnchorError> {
        let data = self.call(wire::encode_verify_credential(owner, hash)).await?;
        wire::decode_bool(&data)
    }

    async fn credential_owner(&self, hash: &[u8; 32]) -> Result<OwnerAddress, AnchorError> {
        let data = self.call(wire::encode_get_credential_owner(hash)).await?;
        wire::decode_address(&data)
    }
}
