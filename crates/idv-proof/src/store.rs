//! # Credential Store
//!
//! The persistence layer is an external collaborator. The proof side only
//! needs to look a credential up by digest, so that is all the trait asks.

use std::collections::HashMap;

use async_trait::async_trait;
use idv_core::{CredentialDigest, CredentialType, OwnerAddress, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A credential as the persistence layer holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub digest: CredentialDigest,
    pub credential_type: CredentialType,
    pub created_at: Timestamp,
    /// Off-chain activity flag. Revocation clears it.
    pub is_active: bool,
    /// Wallet address of the owning user.
    pub owner_address: OwnerAddress,
}

/// Errors from a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no credential with digest {0}")]
    UnknownDigest(CredentialDigest),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Lookup of stored credentials by digest.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The record for `digest`, `None` if nothing is stored under it.
    async fn find_by_digest(
        &self,
        digest: &CredentialDigest,
    ) -> Result<Option<CredentialRecord>, StoreError>;
}

/// Process-local store for tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<CredentialDigest, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records. A later record replaces an earlier one
    /// with the same digest.
    pub fn from_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: CredentialRecord) {
        self.records.write().insert(record.digest, record);
    }

    /// Clear the activity flag of a stored credential.
    pub fn revoke(&self, digest: &CredentialDigest) -> Result<(), StoreError> {
        match self.records.write().get_mut(digest) {
            Some(record) => {
                record.is_active = false;
                Ok(())
            }
            None => Err(StoreError::UnknownDigest(*digest)),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_digest(
        &self,
        digest: &CredentialDigest,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.read().get(digest).cloned())
    }
}
