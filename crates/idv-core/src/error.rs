//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Each failure class gets its own enum so callers can
//! match on exactly what went wrong; `IdvError` wraps them for code that
//! does not care.

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum IdvError {
    /// Payload could not be reduced to canonical bytes.
    #[error("hashing error: {0}")]
    Hashing(#[from] HashingError),

    /// A digest string could not be parsed.
    #[error("digest error: {0}")]
    Digest(#[from] DigestError),

    /// An owner address could not be parsed.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Schema-level validation failure (timestamps, labels).
    #[error("validation error: {0}")]
    Validation(String),
}

/// The credential payload cannot be serialized into its canonical form.
///
/// Unreachable for payloads that are already JSON values; possible for
/// arbitrary `Serialize` types (e.g. maps keyed by non-string types).
#[derive(Error, Debug)]
pub enum HashingError {
    /// JSON serialization failed.
    #[error("payload is not representable as JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the canonical byte stream failed.
    #[error("canonical writer failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A digest string could not be parsed into a `CredentialDigest`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The input contains non-hex characters or an odd number of digits.
    #[error("invalid hex digest {input:?}: {reason}")]
    InvalidHex {
        /// The offending input.
        input: String,
        /// Decoder message.
        reason: String,
    },

    /// The decoded digest does not have the required width.
    #[error("digest must be {expected} bytes, got {actual}")]
    WrongLength {
        /// Required width in bytes.
        expected: usize,
        /// Decoded width in bytes.
        actual: usize,
    },
}

/// An owner address could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Not `0x` followed by exactly 40 hex characters.
    #[error("malformed address {0:?}: expected 0x followed by 40 hex chars")]
    Malformed(String),
}
