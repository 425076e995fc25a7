//! Wallet boundary.
//!
//! A wallet exposes a public key, signs transactions and can send them.
//! Any implementation of [`Wallet`] is interchangeable: a local ed25519
//! keypair, a watch-only address, or a test stub.

use std::env;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use bip39::Mnemonic;
use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{FaucetError, Result};
use crate::pubkey::{Pubkey, Signature};
use crate::rpc::RpcClient;
use crate::transaction::Transaction;

/// Environment variable holding a base58-encoded 64-byte keypair
pub const ENV_KEYPAIR: &str = "FAUCET_KEYPAIR";

/// Environment variable holding a path to a Solana CLI keypair file
pub const ENV_KEYPAIR_PATH: &str = "FAUCET_KEYPAIR_PATH";

/// Capability set of a connected wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Whether this wallet can produce signatures.
    fn can_sign(&self) -> bool {
        true
    }

    /// Fill this wallet's signature slot.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction>;

    /// Sign and broadcast through `rpc`.
    async fn send_transaction(&self, tx: Transaction, rpc: &dyn RpcClient) -> Result<Signature> {
        let signed = self.sign_transaction(tx).await?;
        rpc.send_transaction(&signed).await
    }
}

/// Wallet backed by a local ed25519 signing key.
///
/// The secret is zeroized on drop by `ed25519-dalek`.
pub struct KeypairWallet {
    signing_key: SigningKey,
    pubkey: Pubkey,
}

impl KeypairWallet {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let pubkey = Pubkey::new(signing_key.verifying_key().to_bytes());
        Self { signing_key, pubkey }
    }

    /// Build from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let secret: Zeroizing<[u8; SECRET_KEY_LENGTH]> =
            Zeroizing::new(seed.try_into().map_err(|_| FaucetError::InvalidKey {
                reason: format!("Seed must be {} bytes, got {}", SECRET_KEY_LENGTH, seed.len()),
            })?);
        Ok(Self::from_signing_key(SigningKey::from_bytes(&secret)))
    }

    /// Build from 64 bytes `secret || public`, checking the halves agree.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(FaucetError::InvalidKey {
                reason: format!("Keypair must be 64 bytes, got {}", bytes.len()),
            });
        }
        let wallet = Self::from_seed(&bytes[..32])?;
        if wallet.pubkey.as_ref() != &bytes[32..] {
            return Err(FaucetError::InvalidKey {
                reason: "Keypair public half does not match its secret".to_string(),
            });
        }
        Ok(wallet)
    }

    /// Parse a base58-encoded 64-byte keypair.
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(bs58::decode(encoded.trim()).into_vec().map_err(|e| {
            FaucetError::InvalidKey {
                reason: format!("Invalid base58 key: {}", e),
            }
        })?);
        Self::from_bytes(&bytes)
    }

    /// Read a Solana CLI keypair file (a JSON array of 64 bytes).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = Zeroizing::new(fs::read_to_string(path)?);
        let bytes: Zeroizing<Vec<u8>> =
            Zeroizing::new(serde_json::from_str(&content).map_err(|e| FaucetError::InvalidKey {
                reason: format!("Invalid keypair file {}: {}", path.display(), e),
            })?);
        debug!(path = %path.display(), "loaded keypair file");
        Self::from_bytes(&bytes)
    }

    /// Derive from a BIP-39 phrase the way `solana-keygen` does without a
    /// derivation path: the first 32 bytes of the seed are the secret.
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse(phrase).map_err(|e| FaucetError::InvalidKey {
            reason: format!("Invalid mnemonic: {}", e),
        })?;
        let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
        Self::from_seed(&seed[..32])
    }

    /// Load from `FAUCET_KEYPAIR` or, failing that, `FAUCET_KEYPAIR_PATH`.
    pub fn from_env() -> Result<Self> {
        if let Ok(encoded) = env::var(ENV_KEYPAIR) {
            let encoded = Zeroizing::new(encoded);
            return Self::from_base58(&encoded);
        }
        if let Ok(path) = env::var(ENV_KEYPAIR_PATH) {
            return Self::from_json_file(Path::new(&path));
        }
        Err(FaucetError::Config {
            reason: format!("Missing environment variable: {} or {}", ENV_KEYPAIR, ENV_KEYPAIR_PATH),
        })
    }

    /// Sign raw message bytes.
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::new(self.signing_key.sign(message).to_bytes())
    }

    /// Export as 64 bytes `secret || public`.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 64]> {
        let mut out = Zeroizing::new([0u8; 64]);
        out[..32].copy_from_slice(self.signing_key.as_bytes());
        out[32..].copy_from_slice(self.pubkey.as_ref());
        out
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction> {
        let message = tx.message.serialize()?;
        let signature = self.sign_message(&message);
        tx.add_signature(&self.pubkey, signature)?;
        debug!(signer = %self.pubkey, %signature, "signed transaction");
        Ok(tx)
    }
}

/// Watch-only wallet: knows an address but holds no key.
pub struct ReadOnlyWallet {
    pubkey: Pubkey,
}

impl ReadOnlyWallet {
    pub fn new(pubkey: Pubkey) -> Self {
        Self { pubkey }
    }
}

#[async_trait]
impl Wallet for ReadOnlyWallet {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    fn can_sign(&self) -> bool {
        false
    }

    async fn sign_transaction(&self, _tx: Transaction) -> Result<Transaction> {
        Err(FaucetError::Signing {
            reason: format!("Wallet {} cannot sign transactions", self.pubkey),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{AccountMeta, Instruction};
    use crate::transaction::{Blockhash, Message};
    use ed25519_dalek::{Verifier, VerifyingKey};

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_from_seed_known_pubkey() {
        let seed: Vec<u8> = (0u8..32).collect();
        let wallet = KeypairWallet::from_seed(&seed).unwrap();
        assert_eq!(wallet.pubkey().to_string(), "FAe4sisG95oZ42w7buUn5qEE4TAnfTTFPiguZUHmhiF");
    }

    #[test]
    fn test_base58_round_trip() {
        let wallet = KeypairWallet::from_base58(
            "1GMkH3brNXiNNs1tiFZHu4yZSRrzJwxi5wB9bHFtMikjwpAW9DMZzU2Pqakc5it8X3N5vPmqdN7KF4CCUpmKhq",
        )
        .unwrap();
        assert_eq!(wallet.pubkey().to_string(), "FAe4sisG95oZ42w7buUn5qEE4TAnfTTFPiguZUHmhiF");
        assert_eq!(&wallet.to_bytes()[..32], (0u8..32).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn test_mismatched_keypair_rejected() {
        let mut bytes = *KeypairWallet::generate().to_bytes();
        bytes[40] ^= 0xff;
        assert!(KeypairWallet::from_bytes(&bytes).is_err());
        assert!(KeypairWallet::from_bytes(&bytes[..63]).is_err());
    }

    #[test]
    fn test_from_mnemonic_matches_solana_keygen() {
        let wallet = KeypairWallet::from_mnemonic(MNEMONIC, "").unwrap();
        assert_eq!(wallet.pubkey().to_string(), "EHqmfkN89RJ7Y33CXM6uCzhVeuywHoJXZZLszBHHZy7o");
        assert!(KeypairWallet::from_mnemonic("not a phrase", "").is_err());
    }

    #[test]
    fn test_json_keypair_file() {
        let wallet = KeypairWallet::generate();
        let path = std::env::temp_dir().join("token-faucet-wallet-test.json");
        let json = serde_json::to_string(&wallet.to_bytes().to_vec()).unwrap();
        fs::write(&path, json).unwrap();

        let loaded = KeypairWallet::from_json_file(&path).unwrap();
        assert_eq!(loaded.pubkey(), wallet.pubkey());

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_sign_transaction_verifies() {
        let wallet = KeypairWallet::generate();
        let ix = Instruction {
            program_id: Pubkey::new([9; 32]),
            accounts: vec![AccountMeta::new(wallet.pubkey(), true)],
            data: vec![0],
        };
        let message = Message::compile(&[ix], &wallet.pubkey(), Blockhash([1; 32])).unwrap();
        let tx = wallet.sign_transaction(Transaction::new_unsigned(message)).await.unwrap();
        assert!(tx.is_signed());

        let vk = VerifyingKey::from_bytes(&wallet.pubkey().to_bytes()).unwrap();
        let sig = ed25519_dalek::Signature::from_bytes(&tx.signatures[0].to_bytes());
        assert!(vk.verify(&tx.message.serialize().unwrap(), &sig).is_ok());
    }

    #[tokio::test]
    async fn test_read_only_wallet_cannot_sign() {
        let wallet = ReadOnlyWallet::new(Pubkey::new([4; 32]));
        assert!(!wallet.can_sign());
        let message = Message::compile(&[], &wallet.pubkey(), Blockhash::default()).unwrap();
        assert!(wallet.sign_transaction(Transaction::new_unsigned(message)).await.is_err());
    }
}
