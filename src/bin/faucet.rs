//! Faucet CLI.
//!
//! Inspects the faucet and claims tokens from the command line.
//!
//! Usage:
//!   cargo run --bin faucet -- <status|balance|vault|request> [--config <path>]
//!       [--keypair <path>] [--owner <address>]
//!
//! Without `--keypair` or `--owner` the wallet comes from `FAUCET_KEYPAIR` or
//! `FAUCET_KEYPAIR_PATH`. `FAUCET_*` variables override the config file.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use token_faucet::idl::{instruction_discriminator, AIRDROP_INSTRUCTION};
use token_faucet::{
    pda, FaucetAddresses, FaucetConfig, FaucetController, HttpRpcClient, KeypairWallet, Pubkey,
    ReadOnlyWallet, Result, Wallet,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: faucet <status|balance|vault|request> [--config <path>] [--keypair <path>] [--owner <address>]";

struct Args {
    command: String,
    config: Option<PathBuf>,
    keypair: Option<PathBuf>,
    owner: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args { command: String::new(), config: None, keypair: None, owner: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                parsed.config = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--keypair" if i + 1 < args.len() => {
                parsed.keypair = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--owner" if i + 1 < args.len() => {
                parsed.owner = Some(args[i + 1].clone());
                i += 1;
            }
            cmd if parsed.command.is_empty() && !cmd.starts_with("--") => {
                parsed.command = cmd.to_string();
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if parsed.command.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }
    parsed
}

fn load_config(path: Option<&Path>) -> Result<FaucetConfig> {
    match path {
        Some(path) => FaucetConfig::load(path)?.with_env_overrides(),
        None => FaucetConfig::from_env(),
    }
}

fn load_wallet(args: &Args) -> Result<Arc<dyn Wallet>> {
    if let Some(owner) = &args.owner {
        let pubkey: Pubkey = owner.parse()?;
        return Ok(Arc::new(ReadOnlyWallet::new(pubkey)));
    }
    let wallet = match &args.keypair {
        Some(path) => KeypairWallet::from_json_file(path)?,
        None => KeypairWallet::from_env()?,
    };
    Ok(Arc::new(wallet))
}

fn print_status(config: &FaucetConfig, user: Option<&Pubkey>) -> Result<()> {
    let (vault, vault_bump) = pda::vault_pda(&config.program_id)?;
    let (authority, authority_bump) = pda::vault_authority_pda(&config.program_id)?;
    let (faucet_config, config_bump) = pda::config_pda(&config.program_id)?;

    println!("RPC:              {}", config.rpc_url);
    println!("Commitment:       {}", config.commitment.as_str());
    println!("Program:          {}", config.program_id);
    println!("Mint:             {}", config.mint);
    println!("Vault:            {} (bump {})", vault, vault_bump);
    println!("Vault authority:  {} (bump {})", authority, authority_bump);
    println!("Config:           {} (bump {})", faucet_config, config_bump);
    println!(
        "Discriminator:    {} ({})",
        hex::encode(instruction_discriminator(AIRDROP_INSTRUCTION)),
        AIRDROP_INSTRUCTION
    );

    if let Some(user) = user {
        let addresses = FaucetAddresses::derive(&config.program_id, &config.mint, user)?;
        let (claim_record, _) = pda::user_claim_pda(&config.program_id, user)?;
        println!("Wallet:           {}", user);
        println!("Token account:    {}", addresses.user_ata);
        println!("Claim record:     {}", claim_record);
    }
    Ok(())
}

fn fmt_balance(balance: Option<f64>) -> String {
    balance.map_or_else(|| "unknown".to_string(), |b| b.to_string())
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    info!(rpc = %config.rpc_url, program = %config.program_id, "faucet client");

    if args.command == "status" {
        let user = load_wallet(&args).ok().map(|w| w.pubkey());
        return print_status(&config, user.as_ref());
    }

    let rpc = Arc::new(HttpRpcClient::new(&config.rpc_url, config.commitment));
    let controller = FaucetController::new(config, rpc);

    match args.command.as_str() {
        "vault" => {
            let balance = controller.fetch_vault_balance().await;
            if let Some(error) = controller.state().error {
                eprintln!("{}", error);
                std::process::exit(1);
            }
            println!("Vault balance: {}", fmt_balance(balance));
        }
        "balance" => {
            let state = controller.connect(load_wallet(&args)?).await;
            println!("Your balance:  {}", fmt_balance(state.user_balance));
            println!("Vault balance: {}", fmt_balance(state.vault_balance));
        }
        "request" => {
            let state = controller.connect(load_wallet(&args)?).await;
            println!("Your balance:  {}", fmt_balance(state.user_balance));
            println!("Vault balance: {}", fmt_balance(state.vault_balance));

            match controller.request_tokens().await {
                Ok(signature) => {
                    let state = controller.state();
                    if let Some(message) = state.success {
                        println!("{}", message);
                    }
                    println!("Signature: {}", signature);
                    println!("Your balance:  {}", fmt_balance(state.user_balance));
                }
                Err(e) => {
                    let message = controller.state().error.unwrap_or_else(|| e.to_string());
                    eprintln!("{}", message);
                    std::process::exit(1);
                }
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(parse_args()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
