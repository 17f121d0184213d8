//! # Cipher Vault
//!
//! Authenticated symmetric encryption for the off-chain copy of a credential
//! payload. Each credential gets its own key; the key and the blob are stored
//! side by side by the persistence layer.
//!
//! ## Blob Layout
//!
//! ```text
//! version (1) || nonce (24) || ciphertext || tag (16)
//! ```
//!
//! XChaCha20-Poly1305 with a random 192-bit nonce per encryption. The version
//! byte is bound as associated data, so flipping it fails authentication like
//! any other tampering.
//!
//! Keys come from the OS CSPRNG. There is no password-based derivation: vault
//! keys are unrelated to user login secrets.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

/// Key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// XChaCha20 nonce length in bytes (192 bits).
pub const NONCE_LENGTH: usize = 24;

/// Poly1305 tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Current blob format version.
const BLOB_VERSION: u8 = 1;

const HEADER_LENGTH: usize = 1 + NONCE_LENGTH;

/// Per-credential symmetric key. Zeroed on drop; never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; KEY_LENGTH]);

impl CipherKey {
    /// Restore a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Hex form for storage next to the blob.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    /// Parse the stored hex form.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; KEY_LENGTH];
        hex::decode_to_slice(s.trim(), &mut bytes).map_err(|e| {
            CryptoError::InvalidKey(format!("expected {} hex chars: {e}", KEY_LENGTH * 2))
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

impl PartialEq for CipherKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for CipherKey {}

/// Opaque encrypted payload produced by [`encrypt()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    /// Wrap stored blob bytes. Validity is only checked on decrypt.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The full blob, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex form for text-only storage columns.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse the hex form.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        hex::decode(s.trim())
            .map(Self)
            .map_err(|e| CryptoError::InvalidBlob(e.to_string()))
    }

    /// Blob length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the blob is empty (never true for vault output).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Generate a fresh random key.
pub fn generate_key() -> CipherKey {
    let mut bytes = [0u8; KEY_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    CipherKey(bytes)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// `CryptoError::Encryption` only if the plaintext exceeds the AEAD's
/// length limit.
pub fn encrypt(plaintext: &[u8], key: &CipherKey) -> Result<EncryptedBlob, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);

    let sealed = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &[BLOB_VERSION],
            },
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LENGTH + sealed.len());
    out.push(BLOB_VERSION);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(EncryptedBlob(out))
}

/// Decrypt a blob produced by [`encrypt()`].
///
/// # Errors
///
/// `CryptoError::Decryption` if the blob is truncated, has an unknown
/// version, was encrypted under a different key, or was modified.
pub fn decrypt(blob: &EncryptedBlob, key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
    let bytes = blob.as_bytes();
    if bytes.len() < HEADER_LENGTH + TAG_LENGTH {
        return Err(CryptoError::Decryption(format!(
            "blob truncated: {} bytes, need at least {}",
            bytes.len(),
            HEADER_LENGTH + TAG_LENGTH
        )));
    }
    let (header, sealed) = bytes.split_at(HEADER_LENGTH);
    if header[0] != BLOB_VERSION {
        return Err(CryptoError::Decryption(format!(
            "unsupported blob version {}",
            header[0]
        )));
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(
            XNonce::from_slice(&header[1..]),
            Payload {
                msg: sealed,
                aad: &header[..1],
            },
        )
        .map_err(|_| CryptoError::Decryption("authentication failed".to_string()))
}
