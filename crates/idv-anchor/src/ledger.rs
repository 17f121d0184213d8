//! # Ledger Bindings
//!
//! The [`Ledger`] trait is the seam between the anchor adapter and a concrete
//! credential registry. Two implementations ship:
//!
//! - [`InMemoryLedger`]: enforces the registry contract's rules in process.
//!   Used by tests and by the CLI when no node is configured.
//! - [`EvmLedger`]: talks to a deployed registry contract over Ethereum
//!   JSON-RPC.
//!
//! Implementations take the hash already in its `bytes32` wire form; width
//! adaptation happens once in [`crate::wire::to_bytes32`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use idv_core::{CredentialType, OwnerAddress};
use parking_lot::RwLock;

use crate::error::AnchorError;
use crate::receipt::AnchorReceipt;

mod evm;

pub use evm::{EvmLedger, EvmLedgerConfig};

/// A credential registry the adapter can anchor to.
#[async_trait]
pub trait Ledger: Send + Sync + std::fmt::Debug {
    /// Address of the registry contract, `None` when unbound.
    fn contract_address(&self) -> Option<OwnerAddress>;

    /// Whether this binding can send transactions.
    fn can_sign(&self) -> bool;

    /// `storeCredential(owner, hash, type)`.
    async fn store_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
        credential_type: &CredentialType,
    ) -> Result<AnchorReceipt, AnchorError>;

    /// `revokeCredential(owner, hash)`.
    async fn revoke_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<AnchorReceipt, AnchorError>;

    /// `verifyCredential(owner, hash)`: true only for an active credential
    /// owned by `owner`.
    async fn verify_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<bool, AnchorError>;

    /// `getCredentialOwner(hash)`: the zero address for unknown hashes.
    async fn credential_owner(&self, hash: &[u8; 32]) -> Result<OwnerAddress, AnchorError>;
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    owner: OwnerAddress,
    credential_type: CredentialType,
    active: bool,
}

/// In-process credential registry.
///
/// Applies the same `require` checks as the deployed contract: non-zero
/// owner and hash, no duplicate hashes, revocation only by the recorded
/// owner. Revoked entries keep their owner mapping.
#[derive(Debug)]
pub struct InMemoryLedger {
    contract: OwnerAddress,
    signer: bool,
    entries: RwLock<HashMap<[u8; 32], RegistryEntry>>,
    next_block: AtomicU64,
}

/// Fixed address reported by [`InMemoryLedger`].
const IN_MEMORY_CONTRACT: [u8; 20] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x1d, 0x01,
];

impl InMemoryLedger {
    /// A registry that can sign.
    pub fn new() -> Self {
        Self {
            contract: OwnerAddress::from_bytes(IN_MEMORY_CONTRACT),
            signer: true,
            entries: RwLock::new(HashMap::new()),
            next_block: AtomicU64::new(1),
        }
    }

    /// A read-only registry, as seen by a deployment without a wallet.
    pub fn read_only() -> Self {
        Self {
            signer: false,
            ..Self::new()
        }
    }

    /// Number of anchored hashes, revoked ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been anchored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered type label of an anchored hash.
    pub fn credential_type(&self, hash: &[u8; 32]) -> Option<CredentialType> {
        self.entries
            .read()
            .get(hash)
            .map(|e| e.credential_type.clone())
    }

    fn receipt(&self, hash: &[u8; 32]) -> AnchorReceipt {
        let block = self.next_block.fetch_add(1, Ordering::SeqCst);
        let mut tx = Vec::with_capacity(40);
        tx.extend_from_slice(hash);
        tx.extend_from_slice(&block.to_be_bytes());
        AnchorReceipt {
            transaction_id: format!("0x{}", idv_core::sha256_bytes(&tx).to_hex()),
            block_number: block,
            gas_used: 21_000,
            status_code: 1,
            simulated: false,
        }
    }

    fn require_signer(&self) -> Result<(), AnchorError> {
        if self.signer {
            Ok(())
        } else {
            Err(AnchorError::Unavailable(
                "no signer account configured".to_string(),
            ))
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn contract_address(&self) -> Option<OwnerAddress> {
        Some(self.contract)
    }

    fn can_sign(&self) -> bool {
        self.signer
    }

    async fn store_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
        credential_type: &CredentialType,
    ) -> Result<AnchorReceipt, AnchorError> {
        self.require_signer()?;
        if owner.is_zero() {
            return Err(AnchorError::Rejected("Invalid user address".to_string()));
        }
        if *hash == [0u8; 32] {
            return Err(AnchorError::Rejected("Invalid credential hash".to_string()));
        }
        {
            let mut entries = self.entries.write();
            if entries.contains_key(hash) {
                return Err(AnchorError::Rejected(
                    "Credential already exists".to_string(),
                ));
            }
            entries.insert(
                *hash,
                RegistryEntry {
                    owner: *owner,
                    credential_type: credential_type.clone(),
                    active: true,
                },
            );
        }
        Ok(self.receipt(hash))
    }

    async fn revoke_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<AnchorReceipt, AnchorError> {
        self.require_signer()?;
        {
            let mut entries = self.entries.write();
            match entries.get_mut(hash) {
                Some(entry) if entry.owner == *owner => entry.active = false,
                _ => {
                    return Err(AnchorError::Rejected(
                        "Credential does not belong to user".to_string(),
                    ))
                }
            }
        }
        Ok(self.receipt(hash))
    }

    async fn verify_credential(
        &self,
        owner: &OwnerAddress,
        hash: &[u8; 32],
    ) -> Result<bool, AnchorError> {
        Ok(self
            .entries
            .read()
            .get(hash)
            .is_some_and(|e| e.owner == *owner && e.active))
    }

    async fn credential_owner(&self, hash: &[u8; 32]) -> Result<OwnerAddress, AnchorError> {
        Ok(self
            .entries
            .read()
            .get(hash)
            .map_or(OwnerAddress::ZERO, |e| e.owner))
    }
}
