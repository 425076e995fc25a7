//! Cluster RPC boundary.
//!
//! [`RpcClient`] is the capability set the controller needs from a cluster:
//! account lookups, token balances, blockhashes, submission and status
//! polling. [`HttpRpcClient`] speaks JSON-RPC over HTTP; [`MemoryRpc`] is an
//! in-process cluster for tests and dry runs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FaucetError, Result};
use crate::pubkey::{Pubkey, Signature};
use crate::transaction::{Blockhash, Transaction};

#[cfg(feature = "rpc")]
mod http;
mod memory;

#[cfg(feature = "rpc")]
pub use http::HttpRpcClient;
pub use memory::MemoryRpc;

/// Devnet RPC endpoint
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Default interval between confirmation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Commitment level for reads and confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// Whether a status at this level meets `required`.
    pub fn satisfies(&self, required: Commitment) -> bool {
        *self >= required
    }
}

impl core::str::FromStr for Commitment {
    type Err = FaucetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(FaucetError::Config {
                reason: format!("Unknown commitment level: {}", other),
            }),
        }
    }
}

/// Minimal view of an on-chain account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Pubkey,
    pub executable: bool,
}

/// Token account balance as reported by `getTokenAccountBalance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw amount in base units, as a decimal string.
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl TokenAmount {
    /// Build from raw base units.
    pub fn from_raw(amount: u64, decimals: u8) -> Self {
        let ui = amount as f64 / 10f64.powi(decimals as i32);
        Self {
            amount: amount.to_string(),
            decimals,
            ui_amount: Some(ui),
            ui_amount_string: Some(ui.to_string()),
        }
    }

    /// Human-readable amount; a missing value counts as zero.
    pub fn ui(&self) -> f64 {
        self.ui_amount.unwrap_or(0.0)
    }
}

/// Blockhash plus the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Blockhash,
    pub last_valid_block_height: u64,
}

/// Processing status of a submitted transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmation_status: Option<Commitment>,
    /// Transaction error as returned by the cluster, if it failed.
    pub err: Option<serde_json::Value>,
}

/// Read and write calls against a cluster.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Fetch an account; `None` if it does not exist.
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>>;

    /// Fetch the balance of a token account.
    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenAmount>;

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash>;

    /// Broadcast a signed transaction, returning its signature.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;

    /// Status of a signature; `None` if the cluster has not seen it.
    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>>;

    async fn get_block_height(&self) -> Result<u64>;
}

/// Poll until `signature` reaches `commitment`.
///
/// There is no wall-clock timeout: polling stops when the transaction is
/// confirmed, reports an error, or its blockhash expires.
pub async fn confirm_transaction(
    rpc: &dyn RpcClient,
    signature: &Signature,
    last_valid_block_height: u64,
    commitment: Commitment,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        if let Some(status) = rpc.get_signature_status(signature).await? {
            if let Some(err) = status.err {
                return Err(FaucetError::TransactionFailed {
                    signature: signature.to_string(),
                    reason: err.to_string(),
                });
            }
            if status
                .confirmation_status
                .is_some_and(|level| level.satisfies(commitment))
            {
                info!(%signature, slot = status.slot, commitment = commitment.as_str(), "transaction confirmed");
                return Ok(());
            }
        }

        let height = rpc.get_block_height().await?;
        if height > last_valid_block_height {
            return Err(FaucetError::TransactionExpired {
                signature: signature.to_string(),
            });
        }

        debug!(%signature, height, last_valid_block_height, "awaiting confirmation");
        tokio::time::sleep(poll_interval).await;
    }
}
