//! Anchor receipts and the explicit submission mode.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How `submit` and `revoke` reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Send a transaction from the configured signer account.
    Live,
    /// Fabricate a receipt locally without contacting the ledger.
    Simulated,
}

impl std::fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}

/// Result of a ledger write. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorReceipt {
    /// `0x`-prefixed transaction hash.
    pub transaction_id: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// 1 for success. Reverted transactions never produce a receipt.
    pub status_code: u8,
    /// True when no ledger was contacted.
    pub simulated: bool,
}

impl AnchorReceipt {
    /// A fabricated receipt for simulated submission.
    ///
    /// Transaction id is `0x` plus 64 random hex chars; block number is in
    /// `1..=1_000_000`; gas is in `50_000..=150_000`.
    pub fn simulated() -> Self {
        let mut rng = rand::thread_rng();
        let mut tx = [0u8; 32];
        rng.fill(&mut tx);
        Self {
            transaction_id: format!("0x{}", hex::encode(tx)),
            block_number: rng.gen_range(1..=1_000_000),
            gas_used: rng.gen_range(50_000..=150_000),
            status_code: 1,
            simulated: true,
        }
    }

    /// Returns true if the ledger reported success.
    pub fn succeeded(&self) -> bool {
        self.status_code == 1
    }
}
