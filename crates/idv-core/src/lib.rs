//! # idv-core — Foundational Types for Credential Anchoring
//!
//! Every other crate in the workspace depends on `idv-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every credential fingerprint is computed
//!    over `CanonicalBytes::new()`. Two services that serialize the same
//!    payload with different key order or spacing would otherwise disagree on
//!    the digest anchored on the ledger.
//!
//! 2. **Fixed-width digests.** `CredentialDigest` is exactly 32 bytes and
//!    renders as 64 lowercase hex chars. Ledger-side width adaptation of
//!    externally supplied hex lives in `idv-anchor`, not here.
//!
//! 3. **Newtypes for identifiers.** `OwnerAddress` and `CredentialType` have
//!    validated constructors; no bare strings cross crate boundaries.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is seconds precision with `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `idv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{digest_payload, sha256_bytes, sha256_digest, CredentialDigest, DIGEST_LEN};
pub use error::{AddressError, DigestError, HashingError, IdvError};
pub use identity::{CredentialType, OwnerAddress};
pub use temporal::Timestamp;
