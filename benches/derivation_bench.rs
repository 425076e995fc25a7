//! Benchmarks for address derivation and transaction assembly.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use token_faucet::idl::Idl;
use token_faucet::pda;
use token_faucet::{
    instruction, AirdropAccounts, Blockhash, FaucetConfig, KeypairWallet, Message, Transaction,
    Wallet,
};

/// Bump search, including the vault authority whose first bump is on-curve.
fn bench_pda(c: &mut Criterion) {
    let config = FaucetConfig::default();
    let mut group = c.benchmark_group("pda");

    group.bench_function("vault", |b| b.iter(|| pda::vault_pda(black_box(&config.program_id))));
    group.bench_function("vault_authority", |b| {
        b.iter(|| pda::vault_authority_pda(black_box(&config.program_id)))
    });
    group.bench_function("associated_token_address", |b| {
        let owner = KeypairWallet::generate();
        b.iter(|| pda::associated_token_address(black_box(&owner.pubkey()), &config.mint))
    });

    group.finish();
}

/// Deriving accounts, building the instruction and signing the message.
fn bench_claim_transaction(c: &mut Criterion) {
    let config = FaucetConfig::default();
    let idl = Idl::faucet().unwrap();
    let wallet = KeypairWallet::generate();
    let user = wallet.pubkey();

    c.bench_function("claim_transaction", |b| {
        b.iter(|| {
            let accounts = AirdropAccounts::derive(&config.program_id, &config.mint, &user).unwrap();
            let ix = instruction::airdrop_to_user(&idl, &config.program_id, &accounts).unwrap();
            let message = Message::compile(&[ix], &user, Blockhash([7; 32])).unwrap();
            let mut tx = Transaction::new_unsigned(message);
            let signature = wallet.sign_message(&tx.message.serialize().unwrap());
            tx.add_signature(&user, signature).unwrap();
            black_box(tx.to_base58().unwrap())
        })
    });
}

criterion_group!(benches, bench_pda, bench_claim_transaction);
criterion_main!(benches);
