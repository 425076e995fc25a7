//! Live tests against the Devnet faucet.
//!
//! These tests require network access and a Devnet wallet.
//! They skip automatically if `FAUCET_KEYPAIR` is not set.

#![cfg(feature = "devnet")]

use std::env;
use std::sync::Arc;

use token_faucet::wallet::ENV_KEYPAIR;
use token_faucet::{
    FaucetConfig, FaucetController, HttpRpcClient, KeypairWallet, RpcClient, LIMIT_REACHED_MESSAGE,
};

#[tokio::test]
async fn test_devnet_faucet_suite() {
    if env::var(ENV_KEYPAIR).is_err() {
        println!("Skipping live Devnet tests: {} not set.", ENV_KEYPAIR);
        return;
    }

    let config = FaucetConfig::from_env().expect("Failed to load config");
    let rpc = Arc::new(HttpRpcClient::new(&config.rpc_url, config.commitment));
    let wallet = Arc::new(KeypairWallet::from_env().expect("Failed to load wallet"));
    let controller = FaucetController::new(config, rpc.clone());

    // 1. Balances
    println!("Fetching balances...");
    let state = controller.connect(wallet).await;
    println!("User: {:?} Vault: {:?}", state.user_balance, state.vault_balance);
    assert!(state.user_balance.is_some());

    let height = rpc.get_block_height().await.expect("Failed to get block height");
    assert!(height > 0);

    // 2. Claim, accepting a cooldown rejection from an earlier run
    if !controller.can_request() {
        println!("Vault cannot cover a claim; skipping request.");
        return;
    }
    let before = state.user_balance.unwrap_or_default();
    match controller.request_tokens().await {
        Ok(signature) => {
            println!("Claimed: {}", signature);
            let after = controller.state().user_balance.unwrap_or_default();
            assert!(after >= before + 10.0);
        }
        Err(e) => {
            println!("Claim rejected: {}", e);
            assert_eq!(controller.state().error.as_deref(), Some(LIMIT_REACHED_MESSAGE));
        }
    }
}
