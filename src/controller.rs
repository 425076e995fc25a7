//! Faucet controller.
//!
//! Mediates between a connected wallet, the cluster and the visible faucet
//! state: balances, the loading flag and the error/success banners. State
//! changes are published on a `watch` channel so a front end can redraw on
//! every update.
//!
//! A claim moves the status `Idle -> Loading -> Success | Error`;
//! [`FaucetController::acknowledge`] returns it to `Idle`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::claim::{self, ClaimRejection};
use crate::config::FaucetConfig;
use crate::error::{FaucetError, Result};
use crate::idl::Idl;
use crate::instruction::{self, AirdropAccounts};
use crate::pda;
use crate::pubkey::{Pubkey, Signature};
use crate::rpc::{self, RpcClient};
use crate::transaction::{Message, Transaction};
use crate::wallet::Wallet;

pub const VAULT_BALANCE_ERROR: &str = "Failed to get vault balance";
pub const PROGRAM_INIT_ERROR: &str = "Failed to initialize program";

/// Progress of the last claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaucetState {
    pub wallet: Option<Pubkey>,
    /// `None` until the first fetch completes.
    pub user_balance: Option<f64>,
    pub vault_balance: Option<f64>,
    /// True while any fetch or claim is outstanding.
    pub loading: bool,
    pub status: ClaimStatus,
    pub error: Option<String>,
    pub success: Option<String>,
    pub last_signature: Option<Signature>,
    pending: usize,
}

/// Decrements the outstanding-operation count when dropped.
struct PendingGuard<'a> {
    state: &'a watch::Sender<FaucetState>,
}

impl<'a> PendingGuard<'a> {
    fn begin(state: &'a watch::Sender<FaucetState>) -> Self {
        state.send_modify(|s| {
            s.pending += 1;
            s.loading = true;
        });
        Self { state }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.pending = s.pending.saturating_sub(1);
            s.loading = s.pending > 0;
        });
    }
}

/// Clears the in-flight claim flag when dropped.
struct ClaimGuard<'a>(&'a AtomicBool);

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FaucetController {
    config: FaucetConfig,
    rpc: Arc<dyn RpcClient>,
    idl: Option<Idl>,
    wallet: RwLock<Option<Arc<dyn Wallet>>>,
    state: watch::Sender<FaucetState>,
    claiming: AtomicBool,
}

impl FaucetController {
    /// Build a controller using the bundled program IDL.
    pub fn new(config: FaucetConfig, rpc: Arc<dyn RpcClient>) -> Self {
        let idl = match Idl::faucet() {
            Ok(idl) => Some(idl),
            Err(e) => {
                warn!(error = %e, "bundled IDL unavailable");
                None
            }
        };
        Self::with_idl(config, rpc, idl)
    }

    /// Build a controller with an explicit IDL; `None` means the program
    /// interface is unavailable and claims fail their precondition.
    pub fn with_idl(config: FaucetConfig, rpc: Arc<dyn RpcClient>, idl: Option<Idl>) -> Self {
        let (state, _) = watch::channel(FaucetState::default());
        Self {
            config,
            rpc,
            idl,
            wallet: RwLock::new(None),
            state,
            claiming: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    /// Current state snapshot.
    pub fn state(&self) -> FaucetState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<FaucetState> {
        self.state.subscribe()
    }

    fn current_wallet(&self) -> Option<Arc<dyn Wallet>> {
        match self.wallet.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_wallet(&self, wallet: Option<Arc<dyn Wallet>>) {
        match self.wallet.write() {
            Ok(mut guard) => *guard = wallet,
            Err(poisoned) => *poisoned.into_inner() = wallet,
        }
    }

    /// Connect a wallet and load both balances.
    pub async fn connect(&self, wallet: Arc<dyn Wallet>) -> FaucetState {
        let pubkey = wallet.pubkey();
        info!(wallet = %pubkey, "wallet connected");
        self.set_wallet(Some(wallet));
        self.state.send_modify(|s| {
            s.wallet = Some(pubkey);
            s.user_balance = None;
            s.error = None;
            s.success = None;
            s.status = ClaimStatus::Idle;
        });
        self.on_wallet_connected().await
    }

    /// Drop the wallet and forget user-specific state.
    pub fn disconnect(&self) {
        if let Some(wallet) = self.current_wallet() {
            info!(wallet = %wallet.pubkey(), "wallet disconnected");
        }
        self.set_wallet(None);
        self.state.send_modify(|s| {
            s.wallet = None;
            s.user_balance = None;
            s.error = None;
            s.success = None;
            s.last_signature = None;
            s.status = ClaimStatus::Idle;
        });
    }

    /// Reaction to a wallet connecting: fetch both balances concurrently.
    ///
    /// The fetches are independent; a vault failure never holds back the
    /// user balance.
    pub async fn on_wallet_connected(&self) -> FaucetState {
        let (user, vault) = tokio::join!(self.fetch_user_balance(), self.fetch_vault_balance());
        debug!(user, ?vault, "balances loaded");
        self.state()
    }

    /// Fetch the connected user's token balance.
    ///
    /// A missing token account is a zero balance, and any failure is coerced
    /// to zero as well. Without a wallet this is a no-op returning zero.
    pub async fn fetch_user_balance(&self) -> f64 {
        let wallet = match self.current_wallet() {
            Some(w) => w,
            None => return 0.0,
        };
        let _pending = PendingGuard::begin(&self.state);
        self.state.send_modify(|s| s.error = None);

        let owner = wallet.pubkey();
        let balance = match self.query_user_balance(&owner).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "user balance unavailable, reporting zero");
                0.0
            }
        };
        // the wallet may have changed while the lookup was in flight
        self.state.send_if_modified(|s| {
            if s.wallet != Some(owner) {
                debug!(wallet = %owner, "discarding balance of disconnected wallet");
                return false;
            }
            s.user_balance = Some(balance);
            true
        });
        balance
    }

    async fn query_user_balance(&self, owner: &Pubkey) -> Result<f64> {
        let user_ata = pda::associated_token_address(owner, &self.config.mint)?;
        debug!(%user_ata, "user token account");

        if self.rpc.get_account_info(&user_ata).await?.is_none() {
            return Ok(0.0);
        }
        Ok(self.rpc.get_token_account_balance(&user_ata).await?.ui())
    }

    /// Fetch the vault's token balance.
    ///
    /// On failure the error banner is set and the previous value is kept.
    /// Returns the balance now held in state.
    pub async fn fetch_vault_balance(&self) -> Option<f64> {
        let _pending = PendingGuard::begin(&self.state);
        self.state.send_modify(|s| s.error = None);

        match self.query_vault_balance().await {
            Ok(balance) => {
                self.state.send_modify(|s| s.vault_balance = Some(balance));
            }
            Err(e) => {
                warn!(error = %e, "vault balance fetch failed");
                self.state
                    .send_modify(|s| s.error = Some(VAULT_BALANCE_ERROR.to_string()));
            }
        }
        // release the read guard before `_pending` drops and writes
        let balance = self.state.borrow().vault_balance;
        balance
    }

    async fn query_vault_balance(&self) -> Result<f64> {
        let (vault, _) = pda::vault_pda(&self.config.program_id)?;
        debug!(%vault, "vault PDA");
        Ok(self.rpc.get_token_account_balance(&vault).await?.ui())
    }

    /// Whether the claim control is enabled.
    pub fn can_request(&self) -> bool {
        let state = self.state.borrow();
        let signer = self.current_wallet().is_some_and(|w| w.can_sign());
        signer
            && !state.loading
            && state
                .vault_balance
                .is_some_and(|v| v >= self.config.airdrop_amount)
    }

    /// Claim the fixed airdrop for the connected wallet.
    ///
    /// Preconditions are checked before any network call. Program rejections
    /// for limits, cooldowns or an empty vault are reported with one canonical
    /// message; other failures keep their own text. Both go to the error
    /// banner, and the underlying error is returned.
    ///
    /// A call made while another claim is in flight returns
    /// [`FaucetError::Busy`] and leaves the state untouched.
    pub async fn request_tokens(&self) -> Result<Signature> {
        if self
            .claiming
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FaucetError::Busy);
        }
        let _claim = ClaimGuard(&self.claiming);

        let (wallet, idl) = match self.check_claim_preconditions() {
            Ok(ready) => ready,
            Err(e) => {
                self.fail_claim(e.to_string());
                return Err(e);
            }
        };

        let _pending = PendingGuard::begin(&self.state);
        self.state.send_modify(|s| {
            s.status = ClaimStatus::Loading;
            s.error = None;
            s.success = None;
        });

        match self.submit_claim(wallet.as_ref(), idl).await {
            Ok(signature) => {
                self.on_wallet_connected().await;
                let message = format!("Successfully received {} tokens!", self.config.airdrop_amount);
                info!(%signature, "airdrop claimed");
                self.state.send_modify(|s| {
                    s.status = ClaimStatus::Success;
                    s.success = Some(message);
                    s.last_signature = Some(signature);
                });
                Ok(signature)
            }
            Err(e) => {
                let rejection = claim::classify(&e, idl);
                match &rejection {
                    ClaimRejection::LimitReached { code } => {
                        warn!(?code, error = %e, "claim rejected by program")
                    }
                    ClaimRejection::Other(_) => warn!(error = %e, "claim failed"),
                }
                self.fail_claim(rejection.message());
                Err(e)
            }
        }
    }

    fn check_claim_preconditions(&self) -> Result<(Arc<dyn Wallet>, &Idl)> {
        let wallet = self.current_wallet().ok_or(FaucetError::WalletNotConnected)?;
        if !wallet.can_sign() {
            return Err(FaucetError::ProgramUnavailable {
                reason: PROGRAM_INIT_ERROR.to_string(),
            });
        }
        let idl = self.idl.as_ref().ok_or_else(|| FaucetError::ProgramUnavailable {
            reason: PROGRAM_INIT_ERROR.to_string(),
        })?;

        let vault_balance = self.state.borrow().vault_balance;
        match vault_balance {
            Some(balance) if balance >= self.config.airdrop_amount => Ok((wallet, idl)),
            Some(balance) => Err(FaucetError::VaultInsufficient { balance }),
            None => Err(FaucetError::VaultInsufficient { balance: 0.0 }),
        }
    }

    async fn submit_claim(&self, wallet: &dyn Wallet, idl: &Idl) -> Result<Signature> {
        let user = wallet.pubkey();
        let accounts = AirdropAccounts::derive(&self.config.program_id, &self.config.mint, &user)?;
        debug!(
            vault = %accounts.vault,
            vault_authority = %accounts.vault_authority,
            user_ata = %accounts.user_ata,
            "claim accounts"
        );

        let ix = instruction::airdrop_to_user(idl, &self.config.program_id, &accounts)?;
        let latest = self.rpc.get_latest_blockhash().await?;
        let message = Message::compile(&[ix], &user, latest.blockhash)?;
        let tx = Transaction::new_unsigned(message);

        let signature = wallet.send_transaction(tx, self.rpc.as_ref()).await?;
        info!(%signature, "airdrop transaction submitted");

        rpc::confirm_transaction(
            self.rpc.as_ref(),
            &signature,
            latest.last_valid_block_height,
            self.config.commitment,
            self.config.poll_interval(),
        )
        .await?;
        Ok(signature)
    }

    fn fail_claim(&self, message: String) {
        self.state.send_modify(|s| {
            s.status = ClaimStatus::Error;
            s.error = Some(message);
            s.success = None;
        });
    }

    /// Dismiss banners and return the claim status to idle.
    pub fn acknowledge(&self) {
        self.state.send_modify(|s| {
            s.status = ClaimStatus::Idle;
            s.error = None;
            s.success = None;
        });
    }
}
