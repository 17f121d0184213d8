//! # Credential Issuance
//!
//! The encrypt-then-hash-then-anchor protocol:
//!
//! 1. Digest the payload over its canonical bytes.
//! 2. Generate a fresh key and encrypt the same canonical bytes.
//! 3. Anchor the digest for the owner.
//!
//! Steps 1 and 2 must succeed. Step 3 is best effort: a ledger failure
//! yields `AnchoringOutcome::Skipped` and the credential is still issued.
//!
//! [`CredentialIssuer::open`] reverses step 2 and re-checks step 1.

use std::sync::Arc;

use idv_anchor::{AnchorAdapter, AnchorReceipt};
use idv_core::{digest_payload, CanonicalBytes, CredentialDigest, CredentialType, OwnerAddress};
use idv_crypto::{decrypt, encrypt, generate_key, CipherKey, CryptoError, EncryptedBlob};
use serde::{Deserialize, Serialize};

use crate::error::ProofError;

/// What the persistence layer stores for one credential.
///
/// Serializes as `{digest, encryptedBlob, cipherKey}` with hex strings, key
/// material included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredSealed", into = "StoredSealed")]
pub struct SealedCredential {
    pub digest: CredentialDigest,
    pub blob: EncryptedBlob,
    pub key: CipherKey,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSealed {
    digest: CredentialDigest,
    encrypted_blob: String,
    cipher_key: String,
}

impl From<SealedCredential> for StoredSealed {
    fn from(sealed: SealedCredential) -> Self {
        Self {
            digest: sealed.digest,
            encrypted_blob: sealed.blob.to_hex(),
            cipher_key: sealed.key.to_hex().to_string(),
        }
    }
}

impl TryFrom<StoredSealed> for SealedCredential {
    type Error = CryptoError;

    fn try_from(stored: StoredSealed) -> Result<Self, Self::Error> {
        Ok(Self {
            digest: stored.digest,
            blob: EncryptedBlob::from_hex(&stored.encrypted_blob)?,
            key: CipherKey::from_hex(&stored.cipher_key)?,
        })
    }
}

/// Whether the digest reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnchoringOutcome {
    Anchored(AnchorReceipt),
    Skipped { reason: String },
}

impl AnchoringOutcome {
    /// The receipt, if anchoring happened.
    pub fn receipt(&self) -> Option<&AnchorReceipt> {
        match self {
            Self::Anchored(receipt) => Some(receipt),
            Self::Skipped { .. } => None,
        }
    }
}

/// Result of [`CredentialIssuer::issue`].
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub digest: CredentialDigest,
    pub sealed: SealedCredential,
    pub anchoring: AnchoringOutcome,
}

/// Runs the issuance protocol against a shared anchor adapter.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    adapter: Arc<AnchorAdapter>,
}

impl CredentialIssuer {
    pub fn new(adapter: Arc<AnchorAdapter>) -> Self {
        Self { adapter }
    }

    /// Seal a payload without anchoring it.
    pub fn seal(payload: &impl Serialize) -> Result<SealedCredential, ProofError> {
        let canonical = CanonicalBytes::new(payload)?;
        let digest = idv_core::sha256_digest(&canonical);
        let key = generate_key();
        let blob = encrypt(canonical.as_bytes(), &key)?;
        Ok(SealedCredential { digest, blob, key })
    }

    /// Seal `payload` and anchor its digest for `owner`.
    ///
    /// # Errors
    ///
    /// Hashing and encryption failures. Ledger failures are reported in
    /// [`IssuedCredential::anchoring`] instead.
    pub async fn issue(
        &self,
        payload: &(impl Serialize + Sync),
        credential_type: &CredentialType,
        owner: &OwnerAddress,
    ) -> Result<IssuedCredential, ProofError> {
        let sealed = Self::seal(payload)?;
        let digest = sealed.digest;

        let anchoring = match self
            .adapter
            .submit(owner, &digest.to_hex(), credential_type)
            .await
        {
            Ok(receipt) => AnchoringOutcome::Anchored(receipt),
            Err(e) => {
                tracing::warn!(
                    digest = %digest,
                    owner = %owner,
                    "credential issued without ledger anchoring: {e}"
                );
                AnchoringOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        Ok(IssuedCredential {
            digest,
            sealed,
            anchoring,
        })
    }

    /// Decrypt a sealed credential and check it against its digest.
    ///
    /// # Errors
    ///
    /// `Crypto` for a wrong key or damaged blob, `MalformedPayload` if the
    /// plaintext is not JSON, `IntegrityMismatch` if it re-digests
    /// differently.
    pub fn open(sealed: &SealedCredential) -> Result<serde_json::Value, ProofError> {
        let plaintext = decrypt(&sealed.blob, &sealed.key)?;
        let payload: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| ProofError::MalformedPayload(e.to_string()))?;
        let actual = digest_payload(&payload)?;
        if actual != sealed.digest {
            return Err(ProofError::IntegrityMismatch {
                expected: sealed.digest,
                actual,
            });
        }
        Ok(payload)
    }
}
