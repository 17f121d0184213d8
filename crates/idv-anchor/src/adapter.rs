//! # Anchor Adapter
//!
//! The one entry point the rest of the system uses to reach the ledger.
//! Constructed once at startup from [`AnchorConfig`] and shared by `Arc`;
//! never mutated afterwards.
//!
//! ## Policy
//!
//! | Situation | `submit` / `revoke` | `query` | `get_owner` |
//! |---|---|---|---|
//! | No contract binding | `Unavailable` | `Unavailable` | `Unavailable` |
//! | Bound, mode `Simulated` | fabricated receipt | `Unavailable` | ledger read |
//! | Bound, mode `Live` | signed transaction | ledger read | ledger read |
//!
//! In `Simulated` mode nothing this adapter submits reaches the ledger, so a
//! "not anchored" answer from `verifyCredential` carries no information and
//! `query` reports the ledger as unavailable instead.
//!
//! Reads retry `Transport` failures within the configured bound. Writes are
//! attempted once. Caller-supplied digests are converted to the contract's
//! `bytes32` by [`wire::to_bytes32`] on every path.

use std::sync::Arc;

use idv_core::{CredentialType, OwnerAddress};

use crate::config::{AnchorConfig, ConfigError};
use crate::error::AnchorError;
use crate::ledger::{EvmLedger, EvmLedgerConfig, Ledger};
use crate::receipt::{AnchorReceipt, SubmissionMode};
use crate::retry::RetryPolicy;
use crate::wire;

/// Ledger anchoring facade.
#[derive(Debug)]
pub struct AnchorAdapter {
    ledger: Option<Arc<dyn Ledger>>,
    mode: SubmissionMode,
    network: String,
    retry: RetryPolicy,
}

impl AnchorAdapter {
    /// Wrap a ledger binding.
    ///
    /// A `Live` mode against a binding that cannot sign is downgraded to
    /// `Simulated`. A binding without a contract address is treated as no
    /// binding at all.
    pub fn new(ledger: Arc<dyn Ledger>, mode: SubmissionMode, network: impl Into<String>) -> Self {
        let network = network.into();
        let Some(contract) = ledger.contract_address() else {
            tracing::info!(network = %network, "no registry contract configured, ledger anchoring disabled");
            return Self::unbound(network);
        };
        let mode = if mode == SubmissionMode::Live && !ledger.can_sign() {
            tracing::warn!("live submission requested without a signer account, using simulated submission");
            SubmissionMode::Simulated
        } else {
            mode
        };
        tracing::info!(
            network = %network,
            contract = %contract,
            mode = %mode,
            "ledger anchoring enabled"
        );
        Self {
            ledger: Some(ledger),
            mode,
            network,
            retry: RetryPolicy::default(),
        }
    }

    /// An adapter with no ledger binding. Every operation is `Unavailable`.
    pub fn unbound(network: impl Into<String>) -> Self {
        Self {
            ledger: None,
            mode: SubmissionMode::Simulated,
            network: network.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build the adapter and its EVM binding from configuration.
    pub fn from_config(config: &AnchorConfig) -> Result<Self, ConfigError> {
        let mode = config.resolve_mode()?;
        if !config.is_bound() {
            tracing::info!(
                network = %config.network,
                mode = %mode,
                "LEDGER_CONTRACT_ADDRESS not set, ledger anchoring disabled"
            );
            return Ok(Self::unbound(config.network.clone()).with_retry(config.retry_policy()));
        }

        let mut evm = EvmLedgerConfig::new(config.rpc_url.clone(), config.contract_address)
            .with_receipt_polling(config.receipt_polls, config.poll_interval());
        evm.signer_address = config.signer_address;
        evm.gas_limit = config.gas_limit;
        evm.timeout_secs = config.timeout_secs;
        let ledger = EvmLedger::new(evm).map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self::new(Arc::new(ledger), mode, config.network.clone())
            .with_retry(config.retry_policy()))
    }

    /// Replace the read retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether a ledger binding is present.
    pub fn is_bound(&self) -> bool {
        self.ledger.is_some()
    }

    /// Effective submission mode.
    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// Network label reported in proofs.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Registry contract address, if bound.
    pub fn contract_address(&self) -> Option<OwnerAddress> {
        self.ledger.as_ref().and_then(|l| l.contract_address())
    }

    fn ledger(&self) -> Result<&Arc<dyn Ledger>, AnchorError> {
        self.ledger
            .as_ref()
            .ok_or_else(|| AnchorError::Unavailable("contract address not configured".to_string()))
    }

    /// Anchor `digest` for `owner` under `credential_type`.
    pub async fn submit(
        &self,
        owner: &OwnerAddress,
        digest: &str,
        credential_type: &CredentialType,
    ) -> Result<AnchorReceipt, AnchorError> {
        let ledger = self.ledger()?;
        let hash = wire::to_bytes32(digest)?;
        let receipt = match self.mode {
            SubmissionMode::Simulated => AnchorReceipt::simulated(),
            SubmissionMode::Live => {
                ledger
                    .store_credential(owner, &hash, credential_type)
                    .await?
            }
        };
        tracing::info!(
            owner = %owner,
            digest,
            credential_type = %credential_type,
            tx = %receipt.transaction_id,
            block = receipt.block_number,
            simulated = receipt.simulated,
            "credential anchored"
        );
        Ok(receipt)
    }

    /// Mark an anchored credential revoked on the ledger.
    pub async fn revoke(
        &self,
        owner: &OwnerAddress,
        digest: &str,
    ) -> Result<AnchorReceipt, AnchorError> {
        let ledger = self.ledger()?;
        let hash = wire::to_bytes32(digest)?;
        let receipt = match self.mode {
            SubmissionMode::Simulated => AnchorReceipt::simulated(),
            SubmissionMode::Live => ledger.revoke_credential(owner, &hash).await?,
        };
        tracing::info!(
            owner = %owner,
            digest,
            tx = %receipt.transaction_id,
            simulated = receipt.simulated,
            "credential revoked on ledger"
        );
        Ok(receipt)
    }

    /// Whether the ledger holds an active credential `digest` owned by `owner`.
    ///
    /// `Unavailable` in `Simulated` mode.
    pub async fn query(&self, owner: &OwnerAddress, digest: &str) -> Result<bool, AnchorError> {
        let ledger = self.ledger()?;
        let hash = wire::to_bytes32(digest)?;
        if self.mode == SubmissionMode::Simulated {
            return Err(AnchorError::Unavailable(
                "simulated submission mode, ledger holds no submissions".to_string(),
            ));
        }
        let hash = &hash;
        self.retry
            .run("verifyCredential", move || ledger.verify_credential(owner, hash))
            .await
    }

    /// Owner recorded for `digest`, `None` if the ledger does not know it.
    pub async fn get_owner(&self, digest: &str) -> Result<Option<OwnerAddress>, AnchorError> {
        let ledger = self.ledger()?;
        let hash = wire::to_bytes32(digest)?;
        let hash = &hash;
        let owner = self
            .retry
            .run("getCredentialOwner", move || ledger.credential_owner(hash))
            .await?;
        if owner.is_zero() {
            tracing::debug!(digest, "digest not anchored");
        }
        Ok(owner.non_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    const DIGEST: &str = "786991c584f2b95641bce4f987a33fdbf8d9aaee4a3708a0e5d11210c3d35fdd";

    fn alice() -> OwnerAddress {
        OwnerAddress::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    fn passport() -> CredentialType {
        CredentialType::new("passport").unwrap()
    }

    fn live() -> (Arc<InMemoryLedger>, AnchorAdapter) {
        let ledger = Arc::new(InMemoryLedger::new());
        let adapter = AnchorAdapter::new(ledger.clone(), SubmissionMode::Live, "Ethereum");
        (ledger, adapter)
    }

    #[tokio::test]
    async fn unbound_adapter_is_unavailable_everywhere() {
        let adapter = AnchorAdapter::unbound("Ethereum");
        assert!(!adapter.is_bound());
        assert!(adapter.contract_address().is_none());
        assert!(matches!(
            adapter.submit(&alice(), DIGEST, &passport()).await,
            Err(AnchorError::Unavailable(_))
        ));
        assert!(matches!(
            adapter.revoke(&alice(), DIGEST).await,
            Err(AnchorError::Unavailable(_))
        ));
        assert!(matches!(
            adapter.query(&alice(), DIGEST).await,
            Err(AnchorError::Unavailable(_))
        ));
        assert!(matches!(
            adapter.get_owner(DIGEST).await,
            Err(AnchorError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn live_submit_then_query() {
        let (ledger, adapter) = live();
        assert_eq!(adapter.mode(), SubmissionMode::Live);
        let receipt = adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        assert!(!receipt.simulated);
        assert_eq!(ledger.len(), 1);
        assert!(adapter.query(&alice(), DIGEST).await.unwrap());
        assert_eq!(adapter.get_owner(DIGEST).await.unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn prefixed_digest_reaches_same_slot() {
        let (_, adapter) = live();
        adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        let prefixed = format!("0x{DIGEST}");
        assert_eq!(adapter.get_owner(&prefixed).await.unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn unknown_digest_has_no_owner() {
        let (_, adapter) = live();
        assert_eq!(adapter.get_owner(DIGEST).await.unwrap(), None);
        assert!(!adapter.query(&alice(), DIGEST).await.unwrap());
    }

    #[tokio::test]
    async fn simulated_submit_does_not_touch_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        let adapter = AnchorAdapter::new(ledger.clone(), SubmissionMode::Simulated, "Ethereum");
        let receipt = adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        assert!(receipt.simulated);
        assert_eq!(receipt.status_code, 1);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn simulated_query_is_unavailable() {
        let ledger = Arc::new(InMemoryLedger::read_only());
        let adapter = AnchorAdapter::new(ledger, SubmissionMode::Live, "Ethereum");
        adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        assert!(matches!(
            adapter.query(&alice(), DIGEST).await,
            Err(AnchorError::Unavailable(_))
        ));
        assert!(matches!(
            adapter.query(&alice(), "not hex").await,
            Err(AnchorError::InvalidDigest { .. })
        ));
        assert_eq!(adapter.get_owner(DIGEST).await.unwrap(), None);
    }

    #[tokio::test]
    async fn live_without_signer_downgrades() {
        let ledger = Arc::new(InMemoryLedger::read_only());
        let adapter = AnchorAdapter::new(ledger, SubmissionMode::Live, "Ethereum");
        assert_eq!(adapter.mode(), SubmissionMode::Simulated);
        let receipt = adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        assert!(receipt.simulated);
    }

    #[tokio::test]
    async fn invalid_digest_is_reported() {
        let (_, adapter) = live();
        assert!(matches!(
            adapter.get_owner("not hex").await,
            Err(AnchorError::InvalidDigest { .. })
        ));
    }

    #[tokio::test]
    async fn revoke_flips_query() {
        let (_, adapter) = live();
        adapter.submit(&alice(), DIGEST, &passport()).await.unwrap();
        adapter.revoke(&alice(), DIGEST).await.unwrap();
        assert!(!adapter.query(&alice(), DIGEST).await.unwrap());
        assert_eq!(adapter.get_owner(DIGEST).await.unwrap(), Some(alice()));
    }

    #[test]
    fn from_default_config_is_unbound() {
        let config = AnchorConfig::from_vars(|_| None).unwrap();
        let adapter = AnchorAdapter::from_config(&config).unwrap();
        assert!(!adapter.is_bound());
        assert_eq!(adapter.network(), "Ethereum");
        assert_eq!(adapter.mode(), SubmissionMode::Simulated);
    }

    #[test]
    fn from_bound_config_uses_evm_binding() {
        let config = AnchorConfig::from_vars(|name| match name {
            "LEDGER_CONTRACT_ADDRESS" => {
                Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string())
            }
            "LEDGER_SIGNER_ADDRESS" => {
                Some("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".to_string())
            }
            _ => None,
        })
        .unwrap();
        let adapter = AnchorAdapter::from_config(&config).unwrap();
        assert!(adapter.is_bound());
        assert_eq!(adapter.mode(), SubmissionMode::Live);
        assert_eq!(
            adapter.contract_address().map(|a| a.to_checksum()),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string())
        );
    }
}
