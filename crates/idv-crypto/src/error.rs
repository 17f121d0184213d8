//! Errors from the cipher vault.

use thiserror::Error;

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The blob was not produced with this key, or it was corrupted or
    /// truncated after encryption.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The AEAD refused to encrypt (plaintext beyond the cipher's limit).
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Stored key material could not be parsed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// A stored blob could not be decoded from its text form.
    #[error("invalid blob encoding: {0}")]
    InvalidBlob(String),
}
