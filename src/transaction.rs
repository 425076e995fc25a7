//! Legacy transaction message compilation and wire encoding.
//!
//! A message lists every account once, signers first, so the header can
//! describe access by index ranges:
//! `[writable signers | readonly signers | writable | readonly]`.

use core::fmt;
use core::str::FromStr;

use crate::error::{FaucetError, Result};
use crate::instruction::Instruction;
use crate::pubkey::{Pubkey, Signature};

/// Maximum serialized transaction size accepted by the cluster.
pub const PACKET_DATA_SIZE: usize = 1232;

/// Recent blockhash a transaction is anchored to.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Blockhash(pub [u8; 32]);

impl FromStr for Blockhash {
    type Err = FaucetError;

    fn from_str(s: &str) -> Result<Self> {
        let key: Pubkey = s.parse()?;
        Ok(Self(key.to_bytes()))
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self)
    }
}

/// Append `value` in the compact-u16 (shortvec) encoding.
pub fn encode_compact_u16(out: &mut Vec<u8>, value: u16) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn encode_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u16::try_from(len).map_err(|_| FaucetError::Signing {
        reason: format!("Length {} does not fit a compact-u16", len),
    })?;
    encode_compact_u16(out, len);
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Clone, Copy)]
struct KeyFlags {
    key: Pubkey,
    signer: bool,
    writable: bool,
}

impl Message {
    /// Compile instructions into a message paid for by `payer`.
    pub fn compile(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: Blockhash,
    ) -> Result<Self> {
        let mut keys: Vec<KeyFlags> = vec![KeyFlags { key: *payer, signer: true, writable: true }];

        let mut upsert = |key: Pubkey, signer: bool, writable: bool| {
            if let Some(existing) = keys.iter_mut().find(|k| k.key == key) {
                existing.signer |= signer;
                existing.writable |= writable;
            } else {
                keys.push(KeyFlags { key, signer, writable });
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // stable partition keeps the payer at index 0
        let group = |k: &KeyFlags| match (k.signer, k.writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        keys.sort_by_key(group);

        if keys.len() > u8::MAX as usize {
            return Err(FaucetError::Signing {
                reason: format!("Too many accounts in message: {}", keys.len()),
            });
        }

        let count = |g: u8| keys.iter().filter(|k| group(k) == g).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(0) + count(1),
            num_readonly_signed_accounts: count(1),
            num_readonly_unsigned_accounts: count(3),
        };
        let account_keys: Vec<Pubkey> = keys.iter().map(|k| k.key).collect();

        let index_of = |key: &Pubkey| -> u8 {
            // every key was inserted above
            account_keys.iter().position(|k| k == key).unwrap_or_default() as u8
        };
        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// The keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let h = &self.header;
        let signed = h.num_required_signatures as usize;
        if index < signed {
            index < signed - h.num_readonly_signed_accounts as usize
        } else {
            index < self.account_keys.len() - h.num_readonly_unsigned_accounts as usize
        }
    }

    /// Serialize to the bytes that signers sign.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(256);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_len(&mut out, self.account_keys.len())?;
        for key in &self.account_keys {
            out.extend_from_slice(key.as_ref());
        }
        out.extend_from_slice(&self.recent_blockhash.0);

        encode_len(&mut out, self.instructions.len())?;
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_len(&mut out, ix.accounts.len())?;
            out.extend_from_slice(&ix.accounts);
            encode_len(&mut out, ix.data.len())?;
            out.extend_from_slice(&ix.data);
        }
        Ok(out)
    }
}

/// A message plus one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Build an unsigned transaction; every signature slot is zeroed.
    pub fn new_unsigned(message: Message) -> Self {
        let slots = message.header.num_required_signatures as usize;
        Self {
            signatures: vec![Signature::default(); slots],
            message,
        }
    }

    /// Place `signature` in the slot belonging to `signer`.
    pub fn add_signature(&mut self, signer: &Pubkey, signature: Signature) -> Result<()> {
        let index = self
            .message
            .signer_keys()
            .iter()
            .position(|k| k == signer)
            .ok_or_else(|| FaucetError::Signing {
                reason: format!("{} is not a required signer", signer),
            })?;
        self.signatures[index] = signature;
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signatures.iter().all(|s| *s != Signature::default())
    }

    /// The transaction id: the fee payer's signature.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(PACKET_DATA_SIZE);
        encode_len(&mut out, self.signatures.len())?;
        for sig in &self.signatures {
            out.extend_from_slice(&sig.0);
        }
        out.extend_from_slice(&self.message.serialize()?);

        if out.len() > PACKET_DATA_SIZE {
            return Err(FaucetError::Signing {
                reason: format!("Transaction too large: {} > {}", out.len(), PACKET_DATA_SIZE),
            });
        }
        Ok(out)
    }

    /// Base58 wire encoding accepted by `sendTransaction`.
    pub fn to_base58(&self) -> Result<String> {
        Ok(bs58::encode(self.serialize()?).into_string())
    }
}
