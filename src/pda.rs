//! Program-derived address helpers.
//!
//! These mirror the on-chain seeds so client code derives exactly the
//! addresses the faucet program verifies. A PDA is
//! `sha256(seeds || program_id || "ProgramDerivedAddress")` and must not lie
//! on the ed25519 curve.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use crate::error::{FaucetError, Result};
use crate::pubkey::Pubkey;

/// Maximum number of seeds per derivation.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Seed prefixes matching the on-chain program.
pub mod seeds {
    pub const VAULT: &[u8] = b"vault";
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
    pub const CONFIG: &[u8] = b"config";
    pub const USER: &[u8] = b"user";
}

/// SPL Token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// Associated Token Account program (`ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`).
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

/// System program (`11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new([0u8; 32]);

/// Rent sysvar (`SysvarRent111111111111111111111111111111111`).
pub const RENT_SYSVAR_ID: Pubkey = Pubkey::new([
    6, 167, 213, 23, 25, 44, 92, 81, 33, 140, 201, 76, 61, 74, 241, 127, 88, 218, 238, 8, 155,
    161, 253, 68, 227, 219, 217, 138, 0, 0, 0, 0,
]);

/// Whether `bytes` decompresses to a point on the ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Derive an address from a complete seed list, bump included.
///
/// Fails with [`FaucetError::InvalidSeeds`] when the digest is a valid curve
/// point, since such an address could have a private key.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey> {
    if seeds.len() > MAX_SEEDS {
        return Err(FaucetError::MaxSeedLengthExceeded);
    }
    if seeds.iter().any(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(FaucetError::MaxSeedLengthExceeded);
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(FaucetError::InvalidSeeds);
    }
    Ok(Pubkey::new(hash))
}

/// Find the canonical PDA for `seeds`, searching bumps from 255 down.
///
/// Returns `(address, bump)`.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    // the bump occupies one seed slot
    if seeds.len() >= MAX_SEEDS {
        return Err(FaucetError::MaxSeedLengthExceeded);
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        with_bump.extend_from_slice(seeds);
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(FaucetError::InvalidSeeds) => {}
            Err(e) => return Err(e),
        }
    }

    Err(FaucetError::NoViableBump)
}

/// Derive the vault token account PDA.
pub fn vault_pda(program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[seeds::VAULT], program_id)
}

/// Derive the vault authority PDA (signs vault transfers on-chain).
pub fn vault_authority_pda(program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[seeds::VAULT_AUTHORITY], program_id)
}

/// Derive the faucet config PDA.
///
/// Not part of the `airdrop_to_user` account set; used when inspecting a
/// deployment (`faucet status`).
pub fn config_pda(program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[seeds::CONFIG], program_id)
}

/// Derive the per-user claim record PDA (tracks the last claim time).
///
/// Inspection only, like [`config_pda`]; the airdrop instruction does not
/// take this account.
pub fn user_claim_pda(program_id: &Pubkey, user: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[seeds::USER, user.as_ref()], program_id)
}

/// Derive the associated token account of `owner` for `mint` under the
/// classic SPL Token program.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey> {
    associated_token_address_with_program(owner, mint, &TOKEN_PROGRAM_ID)
}

/// Derive the associated token account for an explicit token program.
pub fn associated_token_address_with_program(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
) -> Result<Pubkey> {
    let (address, _) = find_program_address(
        &[owner.as_ref(), token_program_id.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )?;
    Ok(address)
}

/// Addresses the airdrop instruction needs, derived in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaucetAddresses {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub user_ata: Pubkey,
}

impl FaucetAddresses {
    pub fn derive(program_id: &Pubkey, mint: &Pubkey, user: &Pubkey) -> Result<Self> {
        let (vault, _) = vault_pda(program_id)?;
        let (vault_authority, _) = vault_authority_pda(program_id)?;
        let user_ata = associated_token_address(user, mint)?;
        Ok(Self { vault, vault_authority, user_ata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(s: &str) -> Pubkey {
        s.parse().unwrap()
    }

    const PROGRAM: &str = "ZBRsgBJ3YzdRUi8UFquwxUhxd8VqpicaHKFa4hBHHGf";
    const MINT: &str = "9A3BdDctisN5ezCKNNrL6FMdhdA2zT8RDzFxuASr5g89";
    const WALLET: &str = "DC3ZJrhjFFMiTCyRwcKLD8HmzqZoyCXXYiHCxN4XJLxu";

    #[test]
    fn test_well_known_ids() {
        assert_eq!(TOKEN_PROGRAM_ID, pk("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"));
        assert_eq!(ASSOCIATED_TOKEN_PROGRAM_ID, pk("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"));
        assert_eq!(SYSTEM_PROGRAM_ID, pk("11111111111111111111111111111111"));
        assert_eq!(RENT_SYSVAR_ID, pk("SysvarRent111111111111111111111111111111111"));
    }

    #[test]
    fn test_vault_pdas_known_values() {
        let program = pk(PROGRAM);
        assert_eq!(
            vault_pda(&program).unwrap(),
            (pk("62YFm1MZE5a38kzRoFvgnZSHuvX7NDwXShR1TipjUcBe"), 255)
        );
        assert_eq!(
            vault_authority_pda(&program).unwrap(),
            (pk("EGtyD8fq8PUUYiQJdchEKrzuGX1Na8hYcbwYwM1bkiEq"), 254)
        );
        assert_eq!(
            config_pda(&program).unwrap(),
            (pk("38xDQKgSdVMyrdCV2Hb7HWiWFJahLK3KVYt8YPKX2Jns"), 253)
        );
    }

    #[test]
    fn test_user_claim_pda_known_value() {
        let (addr, bump) = user_claim_pda(&pk(PROGRAM), &pk(WALLET)).unwrap();
        assert_eq!(addr, pk("989xF1SDK4MtZLC9FsnJocRv4ySiz4ggBdTvYjEjQQf5"));
        assert_eq!(bump, 255);
    }

    #[test]
    fn test_associated_token_address_known_value() {
        let ata = associated_token_address(&pk(WALLET), &pk(MINT)).unwrap();
        assert_eq!(ata, pk("6uyhouMGHaNHby9NAvynJNryUBZfBvudkgiRUxj2pPwf"));

        let other = associated_token_address(&Pubkey::new([1; 32]), &pk(MINT)).unwrap();
        assert_eq!(other, pk("CPeKvTEttFmkeMFqrjtXzyQ2dtiRmfLpcETHBKPKM6xp"));
    }

    #[test]
    fn test_derivation_deterministic() {
        let program = pk(PROGRAM);
        let a = vault_pda(&program).unwrap();
        let b = vault_pda(&program).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ata_independent_of_call_order() {
        let owner = pk(WALLET);
        let mint = pk(MINT);
        let first = associated_token_address(&owner, &mint).unwrap();
        let _ = vault_authority_pda(&pk(PROGRAM)).unwrap();
        let _ = associated_token_address(&Pubkey::new([9; 32]), &mint).unwrap();
        let second = associated_token_address(&owner, &mint).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_create_program_address_matches_find() {
        let program = pk(PROGRAM);
        let addr = create_program_address(&[seeds::VAULT, &[255]], &program).unwrap();
        assert_eq!(addr, pk("62YFm1MZE5a38kzRoFvgnZSHuvX7NDwXShR1TipjUcBe"));

        // bump 255 lands on the curve for this seed, which is why find returns 254
        let on_curve = create_program_address(&[seeds::VAULT_AUTHORITY, &[255]], &program);
        assert!(matches!(on_curve, Err(FaucetError::InvalidSeeds)));
    }

    #[test]
    fn test_seed_limits() {
        let program = pk(PROGRAM);
        let long = [0u8; MAX_SEED_LEN + 1];
        assert!(matches!(
            create_program_address(&[&long], &program),
            Err(FaucetError::MaxSeedLengthExceeded)
        ));

        let many: Vec<&[u8]> = vec![b"x".as_slice(); MAX_SEEDS];
        assert!(matches!(
            find_program_address(&many, &program),
            Err(FaucetError::MaxSeedLengthExceeded)
        ));
    }

    #[test]
    fn test_derived_addresses_are_off_curve() {
        let derived = FaucetAddresses::derive(&pk(PROGRAM), &pk(MINT), &pk(WALLET)).unwrap();
        assert!(!is_on_curve(&derived.vault.to_bytes()));
        assert!(!is_on_curve(&derived.vault_authority.to_bytes()));
        assert!(!is_on_curve(&derived.user_ata.to_bytes()));
        // wallets are real ed25519 keys
        assert!(is_on_curve(&pk(WALLET).to_bytes()));
    }
}
