//! Anchor IDL model for the faucet program.
//!
//! The IDL is the published interface of the on-chain program: instruction
//! names, ordered account lists with their mutability/signer flags, and the
//! program's custom error codes. The faucet IDL ships with the crate as a
//! static asset.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{FaucetError, Result};
use crate::pubkey::Pubkey;

/// Faucet program IDL bundled with the crate.
pub const FAUCET_IDL_JSON: &str = include_str!("../idl/faucet.json");

/// Name of the airdrop instruction.
pub const AIRDROP_INSTRUCTION: &str = "airdrop_to_user";

/// First custom error code assigned by Anchor to program errors.
pub const ANCHOR_ERROR_OFFSET: u32 = 6000;

/// Compute the 8-byte Anchor discriminator of a global instruction.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"global:");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();

    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idl {
    #[serde(default)]
    pub address: Option<Pubkey>,
    pub metadata: IdlMetadata,
    pub instructions: Vec<IdlInstruction>,
    #[serde(default)]
    pub errors: Vec<IdlErrorCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub spec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlInstruction {
    pub name: String,
    #[serde(default)]
    pub discriminator: Option<[u8; 8]>,
    pub accounts: Vec<IdlAccount>,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl IdlInstruction {
    /// The declared discriminator, or the one Anchor derives from the name.
    pub fn discriminator(&self) -> [u8; 8] {
        self.discriminator
            .unwrap_or_else(|| instruction_discriminator(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlAccount {
    pub name: String,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub signer: bool,
    /// Fixed address (programs, sysvars).
    #[serde(default)]
    pub address: Option<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlErrorCode {
    pub code: u32,
    pub name: String,
    #[serde(default)]
    pub msg: Option<String>,
}

impl Idl {
    /// Parse an IDL from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FaucetError::ProgramUnavailable {
            reason: format!("Failed to parse program IDL: {}", e),
        })
    }

    /// The bundled faucet IDL.
    pub fn faucet() -> Result<Self> {
        Self::from_json(FAUCET_IDL_JSON)
    }

    /// Look up an instruction by its snake_case name.
    pub fn instruction(&self, name: &str) -> Result<&IdlInstruction> {
        self.instructions
            .iter()
            .find(|ix| ix.name == name)
            .ok_or_else(|| FaucetError::ProgramUnavailable {
                reason: format!("{} method not found in program", name),
            })
    }

    /// Look up a program error by its custom error code.
    pub fn error(&self, code: u32) -> Option<&IdlErrorCode> {
        self.errors.iter().find(|e| e.code == code)
    }
}
