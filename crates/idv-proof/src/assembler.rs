//! # Proof Assembler
//!
//! Builds the client-facing proof for a stored credential and answers the
//! verification predicate.
//!
//! Neither operation fails because of the ledger. `build_proof` reports an
//! anchor error inside the proof; `verify` falls back to the off-chain
//! activity flag.

use std::sync::Arc;

use idv_anchor::{AnchorAdapter, AnchorError};
use idv_core::{CredentialDigest, CredentialType, OwnerAddress, Timestamp};
use serde::Serialize;

use crate::error::ProofError;
use crate::store::{CredentialRecord, CredentialStore};

/// Ledger section of a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OnChainProof {
    /// The ledger answered.
    #[serde(rename_all = "camelCase")]
    Verified {
        owner_address: Option<OwnerAddress>,
        contract_address: Option<OwnerAddress>,
        network: String,
        verified_on_chain: bool,
    },
    /// The ledger could not be asked.
    #[serde(rename_all = "camelCase")]
    Failed {
        error: String,
        contract_address: Option<OwnerAddress>,
    },
}

impl OnChainProof {
    pub fn is_verified_on_chain(&self) -> bool {
        matches!(
            self,
            Self::Verified {
                verified_on_chain: true,
                ..
            }
        )
    }
}

/// Proof of a stored credential. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub digest: CredentialDigest,
    pub credential_type: CredentialType,
    pub created_at: Timestamp,
    pub is_active: bool,
    pub on_chain: OnChainProof,
}

/// How the ledger contributed to a verification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum LedgerVerdict {
    /// The record is revoked; the ledger was not asked.
    NotConsulted,
    /// The ledger answered.
    Ledger { valid: bool },
    /// The ledger could not be asked; the off-chain flag decided.
    Unreachable { reason: String },
}

/// Full verification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub digest: CredentialDigest,
    pub claimed_owner: OwnerAddress,
    pub is_active: bool,
    pub ledger: LedgerVerdict,
    pub valid: bool,
}

/// Assembles proofs from stored records and the ledger.
pub struct ProofAssembler {
    adapter: Arc<AnchorAdapter>,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ProofAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofAssembler")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl ProofAssembler {
    pub fn new(adapter: Arc<AnchorAdapter>, store: Arc<dyn CredentialStore>) -> Self {
        Self { adapter, store }
    }

    /// Proof for `record`. Never fails.
    pub async fn build_proof(&self, record: &CredentialRecord) -> ProofResult {
        let on_chain = match self.adapter.get_owner(&record.digest.to_hex()).await {
            Ok(owner) => OnChainProof::Verified {
                owner_address: owner,
                contract_address: self.adapter.contract_address(),
                network: self.adapter.network().to_string(),
                verified_on_chain: owner.is_some(),
            },
            Err(e) => {
                log_anchor_failure("proof", &record.digest, &e);
                OnChainProof::Failed {
                    error: e.to_string(),
                    contract_address: self.adapter.contract_address(),
                }
            }
        };

        ProofResult {
            digest: record.digest,
            credential_type: record.credential_type.clone(),
            created_at: record.created_at,
            is_active: record.is_active,
            on_chain,
        }
    }

    /// Look up `digest` and build its proof.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is stored under `digest`; `Store` if the lookup
    /// itself failed.
    pub async fn prove(&self, digest: &CredentialDigest) -> Result<ProofResult, ProofError> {
        let record = self.find(digest).await?;
        Ok(self.build_proof(&record).await)
    }

    /// Whether `digest` is a valid credential of `claimed_owner`.
    pub async fn verify(
        &self,
        digest: &CredentialDigest,
        claimed_owner: &OwnerAddress,
    ) -> Result<bool, ProofError> {
        Ok(self.verify_report(digest, claimed_owner).await?.valid)
    }

    /// [`verify`](Self::verify) with the ledger's contribution spelled out.
    pub async fn verify_report(
        &self,
        digest: &CredentialDigest,
        claimed_owner: &OwnerAddress,
    ) -> Result<VerificationReport, ProofError> {
        let record = self.find(digest).await?;

        let (ledger, valid) = if !record.is_active {
            (LedgerVerdict::NotConsulted, false)
        } else {
            match self.adapter.query(claimed_owner, &digest.to_hex()).await {
                Ok(valid) => (LedgerVerdict::Ledger { valid }, valid),
                Err(e) => {
                    log_anchor_failure("verify", digest, &e);
                    (
                        LedgerVerdict::Unreachable {
                            reason: e.to_string(),
                        },
                        true,
                    )
                }
            }
        };

        Ok(VerificationReport {
            digest: *digest,
            claimed_owner: *claimed_owner,
            is_active: record.is_active,
            ledger,
            valid,
        })
    }

    async fn find(&self, digest: &CredentialDigest) -> Result<CredentialRecord, ProofError> {
        match self.store.find_by_digest(digest).await? {
            Some(record) => Ok(record),
            None => {
                tracing::debug!(digest = %digest, "credential not found");
                Err(ProofError::NotFound(*digest))
            }
        }
    }
}

fn log_anchor_failure(operation: &str, digest: &CredentialDigest, e: &AnchorError) {
    match e {
        AnchorError::Unavailable(_) => {
            tracing::debug!(operation, digest = %digest, "ledger not configured: {e}")
        }
        _ => tracing::warn!(operation, digest = %digest, "ledger lookup failed: {e}"),
    }
}
