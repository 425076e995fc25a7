//! Public key and signature newtypes with base58 encoding.

use core::fmt;
use core::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FaucetError, Result};

/// Length of an ed25519 public key / account address.
pub const PUBKEY_BYTES: usize = 32;

/// Length of an ed25519 signature.
pub const SIGNATURE_BYTES: usize = 64;

/// Account address (32 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey(pub [u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    /// Build a key from a slice, rejecting anything but 32 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| FaucetError::InvalidKey {
            reason: format!("Pubkey must be {} bytes, got {}", PUBKEY_BYTES, bytes.len()),
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = FaucetError;

    fn from_str(s: &str) -> Result<Self> {
        // 44 base58 chars is the upper bound for 32 bytes
        if s.is_empty() || s.len() > 44 {
            return Err(FaucetError::InvalidKey {
                reason: format!("Invalid pubkey length: {}", s.len()),
            });
        }
        let bytes = bs58::decode(s).into_vec().map_err(|e| FaucetError::InvalidKey {
            reason: format!("Invalid pubkey: {}", e),
        })?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Transaction signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl FromStr for Signature {
    type Err = FaucetError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s).into_vec().map_err(|e| FaucetError::InvalidKey {
            reason: format!("Invalid signature: {}", e),
        })?;
        let arr: [u8; SIGNATURE_BYTES] = bytes.as_slice().try_into().map_err(|_| {
            FaucetError::InvalidKey {
                reason: format!("Signature must be {} bytes, got {}", SIGNATURE_BYTES, bytes.len()),
            }
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}
