//! # Credential Digest — Content Fingerprints
//!
//! Defines `CredentialDigest`, the 32-byte SHA-256 fingerprint of a
//! credential payload, and the hashing entry points that produce it.
//!
//! ## Security Invariant
//!
//! Payload fingerprints are computed only from `CanonicalBytes`, through
//! [`digest_payload()`] or [`sha256_digest()`]. [`sha256_bytes()`] exists for
//! structural hashing over bytes that are already fully determined (Merkle
//! interior nodes, the empty-input sentinel) and must not be used on payloads.
//!
//! The digest is a content fingerprint, not a password hash: no salt, no
//! randomness. Equal canonical payloads always produce equal digests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::{DigestError, HashingError};

/// Width of a credential digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 256-bit SHA-256 fingerprint.
///
/// Serializes as 64 lowercase hex chars, the form the persistence layer
/// stores and the proof endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CredentialDigest([u8; DIGEST_LEN]);

impl CredentialDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-char hex digest. A `0x` prefix and uppercase digits are
    /// accepted.
    ///
    /// This is strict: the ledger boundary's pad/truncate rule for
    /// foreign-width input is applied in `idv-anchor`, not here.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let decoded = hex::decode(body).map_err(|e| DigestError::InvalidHex {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; DIGEST_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| DigestError::WrongLength {
                    expected: DIGEST_LEN,
                    actual: decoded.len(),
                })?;
        Ok(Self(bytes))
    }

    /// The raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for CredentialDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for CredentialDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CredentialDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CredentialDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Fingerprint a credential payload: canonicalize, then SHA-256.
///
/// # Errors
///
/// Returns [`HashingError`] only when the payload cannot be represented as
/// JSON at all.
pub fn digest_payload(payload: &impl Serialize) -> Result<CredentialDigest, HashingError> {
    let canonical = CanonicalBytes::new(payload)?;
    Ok(sha256_digest(&canonical))
}

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> CredentialDigest {
    sha256_bytes(data.as_bytes())
}

/// Compute the SHA-256 digest of raw bytes.
///
/// For structural hashing only; payloads go through [`digest_payload()`].
pub fn sha256_bytes(data: &[u8]) -> CredentialDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(&hash);
    CredentialDigest(bytes)
}
