//! Faucet client configuration.
//!
//! Cluster endpoint, program and mint identifiers are explicit values passed
//! to the controller at construction. Defaults target the Devnet deployment;
//! a JSON file and environment variables can override them.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FaucetError, Result};
use crate::pubkey::Pubkey;
use crate::rpc::{Commitment, DEVNET_RPC_URL};

/// Devnet faucet program
pub const DEVNET_PROGRAM_ID: &str = "ZBRsgBJ3YzdRUi8UFquwxUhxd8VqpicaHKFa4hBHHGf";

/// Devnet faucet token mint
pub const DEVNET_MINT: &str = "9A3BdDctisN5ezCKNNrL6FMdhdA2zT8RDzFxuASr5g89";

/// Tokens transferred per claim (fixed by the program)
pub const AIRDROP_AMOUNT: f64 = 10.0;

/// Floor for the confirmation poll interval, in milliseconds
pub const MIN_CONFIRM_POLL_MS: u64 = 50;

pub const ENV_RPC_URL: &str = "FAUCET_RPC_URL";
pub const ENV_PROGRAM_ID: &str = "FAUCET_PROGRAM_ID";
pub const ENV_MINT: &str = "FAUCET_MINT";
pub const ENV_COMMITMENT: &str = "FAUCET_COMMITMENT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FaucetConfig {
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub mint: Pubkey,
    pub commitment: Commitment,
    /// Tokens the program hands out per claim; used only to gate the claim.
    pub airdrop_amount: f64,
    /// Delay between confirmation polls, in milliseconds. Values below
    /// [`MIN_CONFIRM_POLL_MS`] are raised to it.
    pub confirm_poll_ms: u64,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEVNET_RPC_URL.to_string(),
            program_id: devnet_key(DEVNET_PROGRAM_ID),
            mint: devnet_key(DEVNET_MINT),
            commitment: Commitment::Confirmed,
            airdrop_amount: AIRDROP_AMOUNT,
            confirm_poll_ms: 500,
        }
    }
}

// The Devnet constants are valid base58 keys; a failure here means the
// constant itself was edited.
fn devnet_key(s: &str) -> Pubkey {
    s.parse().unwrap_or_default()
}

impl FaucetConfig {
    /// Devnet defaults with a custom program and mint.
    pub fn new(program_id: Pubkey, mint: Pubkey) -> Self {
        Self { program_id, mint, ..Self::default() }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms.max(MIN_CONFIRM_POLL_MS))
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| FaucetError::Config {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| FaucetError::Config {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| FaucetError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply `FAUCET_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = env::var(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Ok(program) = env::var(ENV_PROGRAM_ID) {
            self.program_id = program.parse()?;
        }
        if let Ok(mint) = env::var(ENV_MINT) {
            self.mint = mint.parse()?;
        }
        if let Ok(commitment) = env::var(ENV_COMMITMENT) {
            self.commitment = commitment.parse()?;
        }
        Ok(self)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devnet_defaults() {
        let config = FaucetConfig::default();
        assert_eq!(config.program_id.to_string(), DEVNET_PROGRAM_ID);
        assert_eq!(config.mint.to_string(), DEVNET_MINT);
        assert_eq!(config.rpc_url, DEVNET_RPC_URL);
        assert_eq!(config.airdrop_amount, 10.0);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let dir = env::temp_dir().join("token-faucet-config-zero-poll");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("faucet.json");
        fs::write(&path, r#"{ "confirmPollMs": 0 }"#).unwrap();

        let loaded = FaucetConfig::load(&path).unwrap();
        assert_eq!(loaded.poll_interval(), Duration::from_millis(MIN_CONFIRM_POLL_MS));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_and_load() {
        let dir = env::temp_dir().join("token-faucet-config-test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("faucet.json");

        let config = FaucetConfig::new(Pubkey::new([1; 32]), Pubkey::new([2; 32]))
            .with_rpc_url("http://localhost:8899")
            .with_commitment(Commitment::Finalized);
        config.save(&path).unwrap();

        let loaded = FaucetConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = env::temp_dir().join("token-faucet-config-partial");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("faucet.json");
        fs::write(&path, r#"{ "rpcUrl": "http://127.0.0.1:8899" }"#).unwrap();

        let loaded = FaucetConfig::load(&path).unwrap();
        assert_eq!(loaded.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(loaded.mint.to_string(), DEVNET_MINT);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = env::temp_dir().join("token-faucet-config-invalid.json");
        fs::write(&path, r#"{ "mint": "not-a-key" }"#).unwrap();
        assert!(matches!(FaucetConfig::load(&path), Err(FaucetError::Config { .. })));
        let _ = fs::remove_file(&path);
    }
}
