//! # Seal and Open Subcommands
//!
//! `seal` encrypts a JSON payload under a fresh key and prints the stored
//! form `{digest, encryptedBlob, cipherKey}`. With `--owner` and `--type` it
//! runs full issuance and also anchors the digest through the configured
//! ledger.
//!
//! `open` reverses `seal` and checks the payload against its digest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use idv_anchor::AnchorAdapter;
use idv_core::{CredentialDigest, CredentialType, OwnerAddress};
use idv_proof::{AnchoringOutcome, CredentialIssuer, SealedCredential};
use serde::Serialize;

use crate::io::{read_input, read_json, write_json};

/// Arguments for `idv seal`.
#[derive(Args, Debug)]
pub struct SealArgs {
    /// JSON payload file. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Write the sealed credential here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Anchor the digest for this owner address.
    #[arg(long, requires = "credential_type")]
    pub owner: Option<String>,

    /// Credential type label used when anchoring.
    #[arg(long = "type", requires = "owner")]
    pub credential_type: Option<String>,
}

/// Arguments for `idv open`.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Sealed credential JSON produced by `seal`.
    #[arg(long)]
    pub sealed: PathBuf,
}

/// True when `seal` needs a ledger adapter.
pub fn needs_ledger(args: &SealArgs) -> bool {
    args.owner.is_some()
}

pub async fn run_seal(args: &SealArgs, adapter: Option<Arc<AnchorAdapter>>) -> Result<u8> {
    let payload = read_json(args.file.as_deref())?;
    let output = match (&args.owner, &args.credential_type, adapter) {
        (Some(owner), Some(ty), Some(adapter)) => {
            let owner = OwnerAddress::parse(owner).context("--owner")?;
            let ty = CredentialType::new(ty.as_str()).context("--type")?;
            issue(&payload, &ty, &owner, adapter).await?
        }
        _ => serde_json::to_value(CredentialIssuer::seal(&payload)?)?,
    };
    write_json(&output, args.out.as_deref())?;
    Ok(0)
}

#[derive(Serialize)]
struct IssueOutput<'a> {
    digest: CredentialDigest,
    sealed: &'a SealedCredential,
    anchoring: &'a AnchoringOutcome,
}

pub async fn issue(
    payload: &serde_json::Value,
    credential_type: &CredentialType,
    owner: &OwnerAddress,
    adapter: Arc<AnchorAdapter>,
) -> Result<serde_json::Value> {
    let issued = CredentialIssuer::new(adapter)
        .issue(payload, credential_type, owner)
        .await?;
    Ok(serde_json::to_value(IssueOutput {
        digest: issued.digest,
        sealed: &issued.sealed,
        anchoring: &issued.anchoring,
    })?)
}

pub fn run_open(args: &OpenArgs) -> Result<u8> {
    let payload = open_file(&args.sealed)?;
    write_json(&payload, None)?;
    Ok(0)
}

/// Read a sealed credential, or the `sealed` field of an issuance result.
pub fn open_file(path: &std::path::Path) -> Result<serde_json::Value> {
    let mut doc: serde_json::Value = serde_json::from_str(&read_input(Some(path))?)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    if let Some(inner) = doc.get_mut("sealed") {
        doc = inner.take();
    }
    let sealed: SealedCredential =
        serde_json::from_value(doc).context("not a sealed credential")?;
    Ok(CredentialIssuer::open(&sealed)?)
}
