//! Instruction builders for the faucet program.
//!
//! Account order and flags come from the program IDL; instruction data is the
//! Anchor discriminator followed by the (empty) argument payload.

use tracing::debug;

use crate::error::{FaucetError, Result};
use crate::idl::{Idl, IdlInstruction, AIRDROP_INSTRUCTION};
use crate::pda::{
    FaucetAddresses, ASSOCIATED_TOKEN_PROGRAM_ID, RENT_SYSVAR_ID, SYSTEM_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};
use crate::pubkey::Pubkey;

/// An account reference inside an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: true }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: false }
    }
}

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Every account the `airdrop_to_user` instruction expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirdropAccounts {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub user_ata: Pubkey,
    pub user_wallet: Pubkey,
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub system_program: Pubkey,
    pub rent: Pubkey,
}

impl AirdropAccounts {
    /// Derive the account set for `user` claiming `mint` from `program_id`.
    /// The user pays for their own token account.
    pub fn derive(program_id: &Pubkey, mint: &Pubkey, user: &Pubkey) -> Result<Self> {
        let addresses = FaucetAddresses::derive(program_id, mint, user)?;
        Ok(Self::from_addresses(&addresses, mint, user))
    }

    pub fn from_addresses(addresses: &FaucetAddresses, mint: &Pubkey, user: &Pubkey) -> Self {
        Self {
            vault: addresses.vault,
            vault_authority: addresses.vault_authority,
            user_ata: addresses.user_ata,
            user_wallet: *user,
            payer: *user,
            mint: *mint,
            token_program: TOKEN_PROGRAM_ID,
            associated_token_program: ASSOCIATED_TOKEN_PROGRAM_ID,
            system_program: SYSTEM_PROGRAM_ID,
            rent: RENT_SYSVAR_ID,
        }
    }

    /// Resolve an IDL account name.
    pub fn get(&self, name: &str) -> Option<Pubkey> {
        let key = match name {
            "vault" => self.vault,
            "vault_authority" => self.vault_authority,
            "user_ata" | "user_token_account" => self.user_ata,
            "user_wallet" | "user" => self.user_wallet,
            "payer" => self.payer,
            "mint" => self.mint,
            "token_program" => self.token_program,
            "associated_token_program" => self.associated_token_program,
            "system_program" => self.system_program,
            "rent" => self.rent,
            _ => return None,
        };
        Some(key)
    }
}

/// Build an instruction from its IDL definition, resolving each declared
/// account by name.
///
/// Accounts the caller cannot supply fall back to the IDL's fixed address;
/// anything still unresolved is a [`FaucetError::MissingAccount`].
pub fn build_from_idl(
    program_id: &Pubkey,
    ix: &IdlInstruction,
    resolve: impl Fn(&str) -> Option<Pubkey>,
    args: &[u8],
) -> Result<Instruction> {
    let mut accounts = Vec::with_capacity(ix.accounts.len());
    for account in &ix.accounts {
        let pubkey = resolve(&account.name)
            .or(account.address)
            .ok_or_else(|| FaucetError::MissingAccount { name: account.name.clone() })?;
        debug!(account = %account.name, %pubkey, "resolved instruction account");
        accounts.push(AccountMeta {
            pubkey,
            is_signer: account.signer,
            is_writable: account.writable,
        });
    }

    let mut data = Vec::with_capacity(8 + args.len());
    data.extend_from_slice(&ix.discriminator());
    data.extend_from_slice(args);

    Ok(Instruction { program_id: *program_id, accounts, data })
}

/// Build the `airdrop_to_user` instruction. It takes no arguments; the amount
/// is fixed by the program.
pub fn airdrop_to_user(
    idl: &Idl,
    program_id: &Pubkey,
    accounts: &AirdropAccounts,
) -> Result<Instruction> {
    let ix = idl.instruction(AIRDROP_INSTRUCTION)?;
    build_from_idl(program_id, ix, |name| accounts.get(name), &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::IdlAccount;

    fn program() -> Pubkey {
        "ZBRsgBJ3YzdRUi8UFquwxUhxd8VqpicaHKFa4hBHHGf".parse().unwrap()
    }

    fn mint() -> Pubkey {
        "9A3BdDctisN5ezCKNNrL6FMdhdA2zT8RDzFxuASr5g89".parse().unwrap()
    }

    #[test]
    fn test_airdrop_instruction_layout() {
        let user = Pubkey::new([0x11; 32]);
        let accounts = AirdropAccounts::derive(&program(), &mint(), &user).unwrap();
        let idl = Idl::faucet().unwrap();

        let ix = airdrop_to_user(&idl, &program(), &accounts).unwrap();

        assert_eq!(ix.program_id, program());
        assert_eq!(ix.data, vec![206, 249, 151, 161, 147, 153, 133, 110]);
        assert_eq!(ix.accounts.len(), 10);

        assert_eq!(ix.accounts[0], AccountMeta::new(accounts.vault, false));
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(accounts.vault_authority, false));
        assert_eq!(ix.accounts[2], AccountMeta::new(accounts.user_ata, false));
        assert_eq!(ix.accounts[3], AccountMeta::new(user, true));
        assert_eq!(ix.accounts[4], AccountMeta::new(user, true));
        assert_eq!(ix.accounts[5], AccountMeta::new(mint(), false));
        assert_eq!(ix.accounts[6], AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false));
        assert_eq!(ix.accounts[7], AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false));
        assert_eq!(ix.accounts[8], AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false));
        assert_eq!(ix.accounts[9], AccountMeta::new_readonly(RENT_SYSVAR_ID, false));
    }

    #[test]
    fn test_unknown_account_is_missing() {
        let mut idl = Idl::faucet().unwrap();
        idl.instructions[0].accounts.push(IdlAccount {
            name: "config".to_string(),
            writable: false,
            signer: false,
            address: None,
        });
        let accounts = AirdropAccounts::derive(&program(), &mint(), &Pubkey::new([2; 32])).unwrap();

        let err = airdrop_to_user(&idl, &program(), &accounts).unwrap_err();
        assert_eq!(err.to_string(), "Account config is undefined or null");
    }

    #[test]
    fn test_fixed_address_fallback() {
        let ix = IdlInstruction {
            name: "noop".to_string(),
            discriminator: None,
            accounts: vec![IdlAccount {
                name: "clock".to_string(),
                writable: false,
                signer: false,
                address: Some(Pubkey::new([5; 32])),
            }],
            args: vec![],
        };
        let built = build_from_idl(&program(), &ix, |_| None, &[1, 2]).unwrap();
        assert_eq!(built.accounts[0].pubkey, Pubkey::new([5; 32]));
        assert_eq!(&built.data[8..], &[1, 2]);
    }
}
