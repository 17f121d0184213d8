//! # idv-anchor — Ledger Anchoring for Credential Digests
//!
//! Records credential digests on an external credential registry and reads
//! them back.
//!
//! ## Architecture
//!
//! - [`AnchorAdapter`]: the only type callers use. Owns the binding policy
//!   (unbound ⇒ `Unavailable`), the explicit [`SubmissionMode`], and read
//!   retries.
//! - [`Ledger`]: the registry seam. [`EvmLedger`] speaks Ethereum JSON-RPC;
//!   [`InMemoryLedger`] applies the contract's rules in process.
//! - [`wire`]: `bytes32` conversion and ABI calldata, in one place.
//! - [`AnchorConfig`]: environment-driven startup configuration.
//!
//! ## Error Model
//!
//! "Not found" is never an error: `query` answers `false` and `get_owner`
//! answers `None`. See [`AnchorError`] for the rest.

pub mod adapter;
pub mod config;
pub mod error;
pub mod ledger;
pub mod receipt;
pub mod retry;
pub mod wire;

pub use adapter::AnchorAdapter;
pub use config::{AnchorConfig, ConfigError, SubmitModeSetting};
pub use error::AnchorError;
pub use ledger::{EvmLedger, EvmLedgerConfig, InMemoryLedger, Ledger};
pub use receipt::{AnchorReceipt, SubmissionMode};
pub use retry::RetryPolicy;
