//! # Token Faucet
//!
//! Client for a Solana SPL token faucet program.
//!
//! The on-chain program holds tokens in a vault PDA and hands a fixed amount
//! to any wallet that calls `airdrop_to_user`, subject to a per-user cooldown.
//! This crate derives every address the call needs, builds and signs the
//! transaction, submits it over JSON-RPC and tracks the visible faucet state.
//!
//! ## Features
//!
//! - **Address derivation**: program-derived and associated token addresses
//! - **IDL-driven instructions**: accounts resolved by name from the program IDL
//! - **Pluggable boundaries**: [`Wallet`] and [`RpcClient`] traits with
//!   keypair, watch-only, HTTP and in-memory implementations
//! - **Claim orchestration**: [`FaucetController`] with balance fetching,
//!   claim gating and rejection classification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use token_faucet::{FaucetConfig, FaucetController, HttpRpcClient, KeypairWallet};
//!
//! # async fn run() -> token_faucet::Result<()> {
//! let config = FaucetConfig::from_env()?;
//! let rpc = Arc::new(HttpRpcClient::new(&config.rpc_url, config.commitment));
//! let controller = FaucetController::new(config, rpc);
//!
//! controller.connect(Arc::new(KeypairWallet::from_env()?)).await;
//! if controller.can_request() {
//!     let signature = controller.request_tokens().await?;
//!     println!("claimed: {}", signature);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Security
//!
//! - Secret keys are zeroized on drop
//! - Transactions are signed locally; only signed bytes leave the process

pub mod claim;
pub mod config;
pub mod controller;
pub mod error;
pub mod idl;
pub mod instruction;
pub mod pda;
pub mod pubkey;
pub mod rpc;
pub mod transaction;
pub mod wallet;

// Re-export the main entry points
pub use claim::{classify, ClaimRejection, LIMIT_REACHED_MESSAGE};
pub use config::FaucetConfig;
pub use controller::{ClaimStatus, FaucetController, FaucetState};
pub use pda::{associated_token_address, find_program_address, FaucetAddresses};

// Re-export types
pub use error::{FaucetError, Result};
pub use idl::Idl;
pub use instruction::{AccountMeta, AirdropAccounts, Instruction};
pub use pubkey::{Pubkey, Signature};
#[cfg(feature = "rpc")]
pub use rpc::HttpRpcClient;
pub use rpc::{Commitment, MemoryRpc, RpcClient};
pub use transaction::{Blockhash, Message, Transaction};
pub use wallet::{KeypairWallet, ReadOnlyWallet, Wallet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
