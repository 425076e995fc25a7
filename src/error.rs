//! Error types for faucet client operations.
//!
//! Provides strongly-typed errors using `thiserror`. Precondition errors carry
//! the message shown to the user verbatim.

use thiserror::Error;

/// Errors that can occur while deriving addresses, building transactions or
/// talking to the cluster.
#[derive(Debug, Error)]
pub enum FaucetError {
    /// A key or signature string could not be decoded
    #[error("Invalid key encoding: {reason}")]
    InvalidKey { reason: String },

    /// A PDA seed exceeded the allowed length or count
    #[error("Max seed length exceeded")]
    MaxSeedLengthExceeded,

    /// The derived address lies on the ed25519 curve
    #[error("Provided seeds do not result in a valid address")]
    InvalidSeeds,

    /// No bump in 0..=255 produced an off-curve address
    #[error("Unable to find a viable program address bump seed")]
    NoViableBump,

    /// No wallet is connected to the controller
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// The program interface could not be constructed from the IDL
    #[error("{reason}")]
    ProgramUnavailable { reason: String },

    /// An account required by the instruction could not be resolved
    #[error("Account {name} is undefined or null")]
    MissingAccount { name: String },

    /// Signing failed or the wallet refused to sign
    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    /// HTTP transport or response parsing failure
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// JSON-RPC error object returned by the cluster
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The requested account does not exist on-chain
    #[error("Account {address} not found")]
    AccountNotFound { address: String },

    /// The transaction landed but the program returned an error
    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: String, reason: String },

    /// The blockhash expired before the transaction was confirmed
    #[error("Transaction {signature} expired: block height exceeded")]
    TransactionExpired { signature: String },

    /// The vault cannot cover a single airdrop
    #[error("Insufficient tokens in vault. Current vault balance: {balance}")]
    VaultInsufficient { balance: f64 },

    /// Another claim is already being processed
    #[error("A request is already in progress")]
    Busy,

    /// Configuration could not be read, parsed or written
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for faucet operations.
pub type Result<T> = core::result::Result<T, FaucetError>;
