//! # idv-proof — Credential Issuance and Proofs
//!
//! Composes the hasher, the cipher vault and the anchor adapter into the two
//! flows callers see:
//!
//! - **Issuance** ([`CredentialIssuer`]): digest, seal, anchor. Ledger
//!   failures never fail issuance.
//! - **Proof and verification** ([`ProofAssembler`]): reconstruct a proof
//!   from a stored record and the ledger, and answer whether a digest is a
//!   valid credential of a claimed owner.
//!
//! Persistence is external; [`CredentialStore`] is the lookup the proof side
//! needs from it.

pub mod assembler;
pub mod error;
pub mod issue;
pub mod store;

pub use assembler::{LedgerVerdict, OnChainProof, ProofAssembler, ProofResult, VerificationReport};
pub use error::ProofError;
pub use issue::{AnchoringOutcome, CredentialIssuer, IssuedCredential, SealedCredential};
pub use store::{CredentialRecord, CredentialStore, InMemoryCredentialStore, StoreError};
