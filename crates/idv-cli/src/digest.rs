//! # Digest Subcommands
//!
//! - `digest`: canonical SHA-256 of a JSON payload.
//! - `merkle-root`: fold a list of digests into one root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use idv_core::{CanonicalBytes, CredentialDigest};
use idv_crypto::{merkle_levels, merkle_root};

use crate::io::{read_input, read_json};

/// Arguments for `idv digest`.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// JSON payload file. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print the canonical form on a second line.
    #[arg(long)]
    pub canonical: bool,
}

/// Arguments for `idv merkle-root`.
#[derive(Args, Debug)]
pub struct MerkleRootArgs {
    /// Digests in order, as 64-char hex.
    pub digests: Vec<String>,

    /// File with one digest per line. Blank lines and `#` comments are skipped.
    #[arg(long, conflicts_with = "digests")]
    pub file: Option<PathBuf>,

    /// Print every level, leaves first, as JSON.
    #[arg(long)]
    pub levels: bool,
}

pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let payload = read_json(args.file.as_deref())?;
    println!("{}", digest_output(&payload, args.canonical)?);
    Ok(0)
}

pub fn run_merkle_root(args: &MerkleRootArgs) -> Result<u8> {
    let digests = match &args.file {
        Some(path) => parse_digest_lines(&read_input(Some(path))?)?,
        None => parse_digests(&args.digests)?,
    };
    tracing::debug!(count = digests.len(), "folding digests");
    println!("{}", merkle_output(&digests, args.levels)?);
    Ok(0)
}

pub fn digest_output(payload: &serde_json::Value, canonical: bool) -> Result<String> {
    let bytes = CanonicalBytes::new(payload)?;
    let digest = idv_core::sha256_digest(&bytes);
    if canonical {
        Ok(format!("{digest}\n{}", bytes.as_str()))
    } else {
        Ok(digest.to_hex())
    }
}

pub fn parse_digests(raw: &[String]) -> Result<Vec<CredentialDigest>> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            CredentialDigest::from_hex(s.trim())
                .with_context(|| format!("digest #{} is not a 64-char hex digest", i + 1))
        })
        .collect()
}

pub fn parse_digest_lines(text: &str) -> Result<Vec<CredentialDigest>> {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    parse_digests(&lines)
}

pub fn merkle_output(digests: &[CredentialDigest], levels: bool) -> Result<String> {
    if levels {
        let rendered: Vec<Vec<String>> = merkle_levels(digests)
            .iter()
            .map(|level| level.iter().map(CredentialDigest::to_hex).collect())
            .collect();
        Ok(serde_json::to_string_pretty(&rendered)?)
    } else {
        Ok(merkle_root(digests).to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_of_reference_payload() {
        let out = digest_output(&json!({"num": "X123", "doc": "passport"}), false).unwrap();
        assert_eq!(
            out,
            "786991c584f2b95641bce4f987a33fdbf8d9aaee4a3708a0e5d11210c3d35fdd"
        );
    }

    #[test]
    fn digest_with_canonical_line() {
        let out = digest_output(&json!({"num": "X123", "doc": "passport"}), true).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap().len(), 64);
        assert_eq!(lines.next().unwrap(), r#"{"doc": "passport", "num": "X123"}"#);
    }

    #[test]
    fn merkle_of_nothing_is_empty_sentinel() {
        assert_eq!(
            merkle_output(&[], false).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_lines_skip_comments() {
        let text = format!("# batch 1\n\n{}\n  {}  \n", "aa".repeat(32), "bb".repeat(32));
        let digests = parse_digest_lines(&text).unwrap();
        assert_eq!(digests.len(), 2);
        assert!(parse_digest_lines("not-a-digest").is_err());
    }

    #[test]
    fn levels_output_is_json() {
        let digests = parse_digests(&["aa".repeat(32), "bb".repeat(32), "cc".repeat(32)]).unwrap();
        let levels: Vec<Vec<String>> =
            serde_json::from_str(&merkle_output(&digests, true).unwrap()).unwrap();
        let sizes: Vec<usize> = levels.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 1]);
        assert_eq!(levels[2][0], merkle_output(&digests, false).unwrap());
    }
}
