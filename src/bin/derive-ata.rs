//! Associated token account lookup.
//!
//! Prints the associated token account of a wallet for a mint. Defaults to the
//! Devnet faucet mint and a fixed wallet.
//!
//! Usage:
//!   cargo run --bin derive-ata -- [--wallet <address>] [--mint <address>]

use std::env;

use token_faucet::config::DEVNET_MINT;
use token_faucet::{associated_token_address, Pubkey};
use tracing_subscriber::EnvFilter;

const DEFAULT_WALLET: &str = "DC3ZJrhjFFMiTCyRwcKLD8HmzqZoyCXXYiHCxN4XJLxu";

fn parse_key(label: &str, value: &str) -> Pubkey {
    match value.parse() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Invalid {} address {}: {}", label, value, e);
            std::process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut wallet = DEFAULT_WALLET.to_string();
    let mut mint = DEVNET_MINT.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--wallet" if i + 1 < args.len() => {
                wallet = args[i + 1].clone();
                i += 1;
            }
            "--mint" if i + 1 < args.len() => {
                mint = args[i + 1].clone();
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Usage: derive-ata [--wallet <address>] [--mint <address>]");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let wallet = parse_key("wallet", &wallet);
    let mint = parse_key("mint", &mint);

    match associated_token_address(&wallet, &mint) {
        Ok(ata) => println!("Associated Token Account (ATA): {}", ata),
        Err(e) => {
            eprintln!("Error deriving ATA: {}", e);
            std::process::exit(1);
        }
    }
}
