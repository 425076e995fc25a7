//! In-process cluster double.
//!
//! Holds accounts and token balances in memory, records every submitted
//! transaction and can emulate the faucet program's transfer so that
//! balance refreshes after a claim observe the new amounts.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use super::{AccountInfo, Commitment, LatestBlockhash, RpcClient, SignatureStatus, TokenAmount};
use crate::error::{FaucetError, Result};
use crate::idl::{instruction_discriminator, AIRDROP_INSTRUCTION};
use crate::pda::TOKEN_PROGRAM_ID;
use crate::pubkey::{Pubkey, Signature};
use crate::transaction::{Blockhash, Transaction};

/// Program behaviour emulated on submission.
#[derive(Debug, Clone, Copy)]
struct AirdropProgram {
    program_id: Pubkey,
    amount: u64,
    decimals: u8,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Pubkey, AccountInfo>,
    balances: HashMap<Pubkey, u64>,
    decimals: u8,
    unreachable: HashSet<Pubkey>,
    offline: bool,
    rejection: Option<String>,
    program: Option<AirdropProgram>,
    sent: Vec<Transaction>,
    statuses: HashMap<Signature, SignatureStatus>,
    slot: u64,
    block_height: u64,
}

/// In-memory [`RpcClient`].
#[derive(Default)]
pub struct MemoryRpc {
    state: Mutex<State>,
}

impl MemoryRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token account holding `amount` base units.
    pub fn with_token_account(self, address: Pubkey, amount: u64, decimals: u8) -> Self {
        {
            let mut state = self.lock();
            state.decimals = decimals;
            state.balances.insert(address, amount);
            state.accounts.insert(
                address,
                AccountInfo { lamports: 2_039_280, owner: TOKEN_PROGRAM_ID, executable: false },
            );
        }
        self
    }

    /// Emulate `airdrop_to_user`: move `amount` base units from the vault to
    /// the user's token account, creating it if needed.
    pub fn with_airdrop_program(self, program_id: Pubkey, amount: u64, decimals: u8) -> Self {
        self.lock().program = Some(AirdropProgram { program_id, amount, decimals });
        self
    }

    /// Make every lookup of `address` fail with a network error.
    pub fn fail_lookups_for(&self, address: Pubkey) {
        self.lock().unreachable.insert(address);
    }

    /// Make every call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Reject the next submissions with `message`, as a failed preflight.
    pub fn reject_transactions(&self, message: &str) {
        self.lock().rejection = Some(message.to_string());
    }

    pub fn clear_rejection(&self) {
        self.lock().rejection = None;
    }

    /// Advance block height, expiring blockhashes issued before.
    pub fn advance_block_height(&self, blocks: u64) {
        self.lock().block_height += blocks;
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.lock().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().sent.len()
    }

    pub fn raw_balance(&self, address: &Pubkey) -> Option<u64> {
        self.lock().balances.get(address).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // a poisoned lock only means a test panicked mid-call
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_reachable(state: &State, address: Option<&Pubkey>) -> Result<()> {
        if state.offline || address.is_some_and(|a| state.unreachable.contains(a)) {
            return Err(FaucetError::Network {
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn apply_airdrop(state: &mut State, tx: &Transaction) -> Result<()> {
        let program = match state.program {
            Some(p) => p,
            None => return Ok(()),
        };
        let discriminator = instruction_discriminator(AIRDROP_INSTRUCTION);
        let keys = &tx.message.account_keys;

        for ix in &tx.message.instructions {
            let is_airdrop = keys.get(ix.program_id_index as usize) == Some(&program.program_id)
                && ix.data.starts_with(&discriminator);
            if !is_airdrop {
                continue;
            }
            let key_at = |pos: usize| -> Result<Pubkey> {
                ix.accounts
                    .get(pos)
                    .and_then(|i| keys.get(*i as usize))
                    .copied()
                    .ok_or_else(|| FaucetError::Rpc {
                        code: -32002,
                        message: "Transaction simulation failed: NotEnoughAccountKeys".to_string(),
                        data: None,
                    })
            };
            let vault = key_at(0)?;
            let user_ata = key_at(2)?;

            let available = state.balances.get(&vault).copied().unwrap_or_default();
            if available < program.amount {
                return Err(FaucetError::Rpc {
                    code: -32002,
                    message: "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771".to_string(),
                    data: Some(serde_json::json!({ "err": { "InstructionError": [0, { "Custom": 6001 }] } })),
                });
            }
            state.balances.insert(vault, available - program.amount);
            *state.balances.entry(user_ata).or_default() += program.amount;
            state.decimals = program.decimals;
            state.accounts.entry(user_ata).or_insert(AccountInfo {
                lamports: 2_039_280,
                owner: TOKEN_PROGRAM_ID,
                executable: false,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RpcClient for MemoryRpc {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>> {
        let state = self.lock();
        Self::check_reachable(&state, Some(address))?;
        Ok(state.accounts.get(address).cloned())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenAmount> {
        let state = self.lock();
        Self::check_reachable(&state, Some(address))?;
        state
            .balances
            .get(address)
            .map(|raw| TokenAmount::from_raw(*raw, state.decimals))
            .ok_or_else(|| FaucetError::Rpc {
                code: -32602,
                message: "Invalid param: could not find account".to_string(),
                data: None,
            })
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash> {
        let state = self.lock();
        Self::check_reachable(&state, None)?;
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&state.block_height.to_le_bytes());
        Ok(LatestBlockhash {
            blockhash: Blockhash(hash),
            last_valid_block_height: state.block_height + 150,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let mut state = self.lock();
        Self::check_reachable(&state, None)?;

        if !tx.is_signed() {
            return Err(FaucetError::Rpc {
                code: -32003,
                message: "Transaction signature verification failure".to_string(),
                data: None,
            });
        }
        if let Some(message) = state.rejection.clone() {
            return Err(FaucetError::Rpc { code: -32002, message, data: None });
        }
        Self::apply_airdrop(&mut state, tx)?;

        let signature = tx.signature().copied().unwrap_or_default();
        state.slot += 1;
        let slot = state.slot;
        state.statuses.insert(
            signature,
            SignatureStatus { slot, confirmation_status: Some(Commitment::Finalized), err: None },
        );
        state.sent.push(tx.clone());
        info!(%signature, slot, "memory cluster accepted transaction");
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        let state = self.lock();
        Self::check_reachable(&state, None)?;
        Ok(state.statuses.get(signature).cloned())
    }

    async fn get_block_height(&self) -> Result<u64> {
        let state = self.lock();
        Self::check_reachable(&state, None)?;
        Ok(state.block_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_account_reports_none() {
        let rpc = MemoryRpc::new();
        assert!(rpc.get_account_info(&Pubkey::new([1; 32])).await.unwrap().is_none());
        assert!(rpc.get_token_account_balance(&Pubkey::new([1; 32])).await.is_err());
    }

    #[tokio::test]
    async fn test_token_balance_scaled_by_decimals() {
        let vault = Pubkey::new([2; 32]);
        let rpc = MemoryRpc::new().with_token_account(vault, 25_000_000_000, 9);
        assert_eq!(rpc.get_token_account_balance(&vault).await.unwrap().ui(), 25.0);
    }

    #[tokio::test]
    async fn test_unreachable_address_fails() {
        let vault = Pubkey::new([2; 32]);
        let rpc = MemoryRpc::new().with_token_account(vault, 1, 0);
        rpc.fail_lookups_for(vault);
        assert!(matches!(
            rpc.get_token_account_balance(&vault).await,
            Err(FaucetError::Network { .. })
        ));
    }
}
