//! Errors from issuance, opening and verification.
//!
//! Anchor failures never appear here: issuance downgrades them to
//! `AnchoringOutcome::Skipped` and proofs downgrade them to annotated results.

use idv_core::{CredentialDigest, HashingError};
use idv_crypto::CryptoError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ProofError {
    /// No stored credential has this digest. A normal outcome.
    #[error("no credential with digest {0}")]
    NotFound(CredentialDigest),

    #[error("hashing error: {0}")]
    Hashing(#[from] HashingError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A decrypted payload is not a JSON document.
    #[error("decrypted payload is not JSON: {0}")]
    MalformedPayload(String),

    /// A decrypted payload no longer hashes to its recorded digest.
    #[error("integrity mismatch: recorded {expected}, payload hashes to {actual}")]
    IntegrityMismatch {
        expected: CredentialDigest,
        actual: CredentialDigest,
    },

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}
