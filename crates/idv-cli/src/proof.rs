//! # Prove and Verify Subcommands
//!
//! Both read credential records from a JSON file (an array of
//! `{digest, credentialType, createdAt, isActive, ownerAddress}`) standing in
//! for the persistence layer, and consult the ledger configured in the
//! environment.
//!
//! `verify` exits 0 for a valid credential and 2 otherwise.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use idv_anchor::AnchorAdapter;
use idv_core::{CredentialDigest, OwnerAddress};
use idv_proof::{
    CredentialRecord, InMemoryCredentialStore, ProofAssembler, ProofResult, VerificationReport,
};

use crate::io::{read_input, write_json};

/// Exit code for a credential that fails verification.
pub const EXIT_INVALID: u8 = 2;

/// Arguments for `idv prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// JSON array of stored credential records.
    #[arg(long)]
    pub records: PathBuf,

    /// Credential digest, 64-char hex.
    #[arg(long)]
    pub digest: String,
}

/// Arguments for `idv verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON array of stored credential records.
    #[arg(long)]
    pub records: PathBuf,

    /// Credential digest, 64-char hex.
    #[arg(long)]
    pub digest: String,

    /// Claimed owner address.
    #[arg(long)]
    pub owner: String,

    /// Print the full report instead of `true`/`false`.
    #[arg(long)]
    pub report: bool,
}

pub fn load_records(path: &Path) -> Result<Vec<CredentialRecord>> {
    serde_json::from_str(&read_input(Some(path))?)
        .with_context(|| format!("{} is not a JSON array of credential records", path.display()))
}

fn assembler(records: &Path, adapter: Arc<AnchorAdapter>) -> Result<ProofAssembler> {
    let store = InMemoryCredentialStore::from_records(load_records(records)?);
    tracing::debug!(records = store.len(), "loaded credential records");
    Ok(ProofAssembler::new(adapter, Arc::new(store)))
}

pub async fn prove(
    records: &Path,
    digest: &str,
    adapter: Arc<AnchorAdapter>,
) -> Result<ProofResult> {
    let digest = CredentialDigest::from_hex(digest).context("--digest")?;
    Ok(assembler(records, adapter)?.prove(&digest).await?)
}

pub async fn verify(
    records: &Path,
    digest: &str,
    owner: &str,
    adapter: Arc<AnchorAdapter>,
) -> Result<VerificationReport> {
    let digest = CredentialDigest::from_hex(digest).context("--digest")?;
    let owner = OwnerAddress::parse(owner).context("--owner")?;
    Ok(assembler(records, adapter)?
        .verify_report(&digest, &owner)
        .await?)
}

pub async fn run_prove(args: &ProveArgs, adapter: Arc<AnchorAdapter>) -> Result<u8> {
    let proof = prove(&args.records, &args.digest, adapter).await?;
    write_json(&proof, None)?;
    Ok(0)
}

pub async fn run_verify(args: &VerifyArgs, adapter: Arc<AnchorAdapter>) -> Result<u8> {
    let report = verify(&args.records, &args.digest, &args.owner, adapter).await?;
    if args.report {
        write_json(&report, None)?;
    } else {
        println!("{}", report.valid);
    }
    Ok(if report.valid { 0 } else { EXIT_INVALID })
}
