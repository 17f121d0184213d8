//! # idv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Ledger settings are read from the environment only for the commands that
//! talk to the ledger.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use idv_anchor::{AnchorAdapter, AnchorConfig};
use idv_cli::digest::{run_digest, run_merkle_root, DigestArgs, MerkleRootArgs};
use idv_cli::proof::{run_prove, run_verify, ProveArgs, VerifyArgs};
use idv_cli::seal::{needs_ledger, run_open, run_seal, OpenArgs, SealArgs};

/// Credential digests, sealing, and ledger anchoring.
#[derive(Parser, Debug)]
#[command(name = "idv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Canonical SHA-256 digest of a JSON payload.
    Digest(DigestArgs),

    /// Merkle root of an ordered list of digests.
    MerkleRoot(MerkleRootArgs),

    /// Encrypt a payload, optionally anchoring its digest.
    Seal(SealArgs),

    /// Decrypt a sealed payload and check it against its digest.
    Open(OpenArgs),

    /// Assemble the ledger proof for a stored credential.
    Prove(ProveArgs),

    /// Verify a stored credential against a claimed owner.
    Verify(VerifyArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("idv CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match dispatch(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn dispatch(command: Commands) -> Result<u8> {
    match command {
        Commands::Digest(args) => run_digest(&args),
        Commands::MerkleRoot(args) => run_merkle_root(&args),
        Commands::Seal(args) => {
            let adapter = if needs_ledger(&args) {
                Some(ledger_adapter()?)
            } else {
                None
            };
            run_seal(&args, adapter).await
        }
        Commands::Open(args) => run_open(&args),
        Commands::Prove(args) => run_prove(&args, ledger_adapter()?).await,
        Commands::Verify(args) => run_verify(&args, ledger_adapter()?).await,
    }
}

fn ledger_adapter() -> Result<Arc<AnchorAdapter>> {
    let config = AnchorConfig::from_env().context("ledger configuration")?;
    let adapter = AnchorAdapter::from_config(&config).context("ledger adapter")?;
    Ok(Arc::new(adapter))
}
