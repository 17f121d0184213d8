//! Ledger anchoring configuration.
//!
//! Loaded once at startup. Defaults point to a local development node with no
//! contract binding, which leaves every anchor operation `Unavailable` and
//! submission simulated.

use std::time::Duration;

use idv_core::OwnerAddress;
use url::Url;

use crate::receipt::SubmissionMode;
use crate::retry::{RetryPolicy, DEFAULT_MAX_RETRIES};

/// Configured submission mode, before resolution against the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitModeSetting {
    /// `Live` when a signer is configured, `Simulated` otherwise.
    #[default]
    Auto,
    Live,
    Simulated,
}

impl std::str::FromStr for SubmitModeSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "live" => Ok(Self::Live),
            "simulated" => Ok(Self::Simulated),
            other => Err(ConfigError::InvalidValue(
                "ANCHOR_SUBMIT_MODE".to_string(),
                format!("expected auto, live or simulated, got {other:?}"),
            )),
        }
    }
}

/// Configuration for the anchor adapter and its ledger binding.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    pub rpc_url: Url,
    /// Registry contract. The zero address means no binding.
    pub contract_address: OwnerAddress,
    pub signer_address: Option<OwnerAddress>,
    pub submit_mode: SubmitModeSetting,
    /// Network label reported in proofs.
    pub network: String,
    pub gas_limit: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub receipt_polls: u32,
}

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_NETWORK: &str = "Ethereum";
const DEFAULT_GAS_LIMIT: u64 = 3_000_000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECEIPT_POLLS: u32 = 20;

impl AnchorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LEDGER_RPC_URL` (default: `http://127.0.0.1:8545`)
    /// - `LEDGER_CONTRACT_ADDRESS` (default: zero address, no binding)
    /// - `LEDGER_SIGNER_ADDRESS` (optional)
    /// - `ANCHOR_SUBMIT_MODE` (`auto` | `live` | `simulated`, default: `auto`)
    /// - `LEDGER_NETWORK` (default: `Ethereum`)
    /// - `LEDGER_GAS_LIMIT` (default: 3000000)
    /// - `LEDGER_TIMEOUT_SECS` (default: 30)
    /// - `ANCHOR_MAX_RETRIES` (default: 2)
    /// - `LEDGER_RECEIPT_POLLS` (default: 20)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let raw_url = get("LEDGER_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::InvalidUrl("LEDGER_RPC_URL".to_string(), e.to_string()))?;
        let contract_address = match get("LEDGER_CONTRACT_ADDRESS") {
            Some(raw) => parse_address("LEDGER_CONTRACT_ADDRESS", &raw)?,
            None => OwnerAddress::ZERO,
        };
        let signer_address = get("LEDGER_SIGNER_ADDRESS")
            .map(|raw| parse_address("LEDGER_SIGNER_ADDRESS", &raw))
            .transpose()?
            .and_then(OwnerAddress::non_zero);
        let submit_mode = get("ANCHOR_SUBMIT_MODE")
            .map(|raw| raw.parse::<SubmitModeSetting>())
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            rpc_url,
            contract_address,
            signer_address,
            submit_mode,
            network: get("LEDGER_NETWORK")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            gas_limit: parse_number(&get, "LEDGER_GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            timeout_secs: parse_number(&get, "LEDGER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            max_retries: parse_number(&get, "ANCHOR_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            receipt_polls: parse_number(&get, "LEDGER_RECEIPT_POLLS", DEFAULT_RECEIPT_POLLS)?,
        };
        config.resolve_mode()?;
        Ok(config)
    }

    /// Resolve the configured mode against the signer.
    ///
    /// # Errors
    ///
    /// `ConfigError::LiveWithoutSigner` when `live` is requested and no
    /// signer account is configured.
    pub fn resolve_mode(&self) -> Result<SubmissionMode, ConfigError> {
        match (self.submit_mode, self.signer_address) {
            (SubmitModeSetting::Live, None) => Err(ConfigError::LiveWithoutSigner),
            (SubmitModeSetting::Live, Some(_)) | (SubmitModeSetting::Auto, Some(_)) => {
                Ok(SubmissionMode::Live)
            }
            (SubmitModeSetting::Auto, None) | (SubmitModeSetting::Simulated, _) => {
                Ok(SubmissionMode::Simulated)
            }
        }
    }

    /// Whether a registry contract is configured.
    pub fn is_bound(&self) -> bool {
        !self.contract_address.is_zero()
    }

    /// Retry policy for ledger reads.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.max_retries)
    }

    /// Receipt poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}

fn parse_address(var: &str, raw: &str) -> Result<OwnerAddress, ConfigError> {
    OwnerAddress::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))
}

fn parse_number<T, G>(get: &G, var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("ANCHOR_SUBMIT_MODE=live requires LEDGER_SIGNER_ADDRESS")]
    LiveWithoutSigner,
    #[error("failed to build ledger client: {0}")]
    Client(String),
}
