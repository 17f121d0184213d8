//! # idv-cli — Credential Anchoring Command-Line Interface
//!
//! ## Subcommands
//!
//! - `digest`: canonical SHA-256 of a JSON payload
//! - `merkle-root`: Merkle root (or every level) of a digest list
//! - `seal` / `open`: encrypt a payload for storage, and reverse it
//! - `prove` / `verify`: ledger proof and verification of stored records
//!
//! Ledger settings come from the environment (`LEDGER_*`,
//! `ANCHOR_SUBMIT_MODE`, `ANCHOR_MAX_RETRIES`). Results go to stdout, logs go
//! to stderr.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to the domain crates.

pub mod digest;
pub mod io;
pub mod proof;
pub mod seal;
