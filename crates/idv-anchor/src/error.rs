//! Anchor error taxonomy.
//!
//! `Unavailable` and `Transport` are deliberately distinct: the first is a
//! deployment fact (no ledger binding) and is never retried, the second is a
//! node or network failure and may succeed on retry. "Not found" is not an
//! error at all; it surfaces as `false` or `None`.

use thiserror::Error;

/// Errors from ledger anchoring operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// No ledger binding is configured, or the binding cannot perform the
    /// requested operation. Permanent until redeployment.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger node could not be reached or returned an unusable
    /// transport-level response. Transient.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The ledger answered but refused the request: a JSON-RPC error, a
    /// reverted transaction, or a malformed call result.
    #[error("ledger rejected request: {0}")]
    Rejected(String),

    /// The digest supplied by the caller is not hex.
    #[error("invalid digest {input:?}: {reason}")]
    InvalidDigest {
        /// The offending input.
        input: String,
        /// Decoder message.
        reason: String,
    },
}

impl AnchorError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
