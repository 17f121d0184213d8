//! # idv-crypto — Cryptographic Primitives
//!
//! - **Merkle aggregation** (`merkle.rs`): folds an ordered list of
//!   credential digests into one root digest.
//! - **Cipher vault** (`vault.rs`): per-credential keys and authenticated
//!   encryption of the off-chain payload copy.
//!
//! The two paths are independent: the vault never sees digests and the
//! Merkle fold never sees plaintext.
//!
//! ## Crate Policy
//!
//! - Depends only on `idv-core` internally.
//! - No mocking of cryptographic operations in tests.

pub mod error;
pub mod merkle;
pub mod vault;

pub use error::CryptoError;
pub use merkle::{fold_level, merkle_levels, merkle_root};
pub use vault::{decrypt, encrypt, generate_key, CipherKey, EncryptedBlob};
