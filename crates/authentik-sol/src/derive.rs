//! Deterministic address derivation.
//!
//! Two schemes are supported:
//!
//! - **Seed addresses** (`create_with_seed`): `SHA-256(base || seed || owner)`.
//!   The base key signs the account creation once; afterwards anyone holding
//!   `(base, seed, owner)` can locate the account without storing its address.
//! - **Program-derived addresses** (`find_program_address`):
//!   `SHA-256(seed_0 || .. || bump || program_id || "ProgramDerivedAddress")`,
//!   searching bump seeds from 255 down until the hash is off the Ed25519
//!   curve. Used here for associated token accounts.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::address::bytes_to_address;
use crate::error::DeriveError;

/// Longest seed accepted by either derivation scheme.
pub const MAX_SEED_LEN: usize = 32;

/// Most seeds accepted by `find_program_address`, bump excluded.
pub const MAX_SEEDS: usize = 16;

/// Suffix hashed into every program-derived address.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
];

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
];

/// An address computed by `create_with_seed`, together with its inputs.
///
/// The inputs travel with the address because creating the account needs
/// the base key and the seed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAddress {
    pub base: [u8; 32],
    pub seed: String,
    pub owner: [u8; 32],
    pub address: [u8; 32],
}

impl DerivedAddress {
    pub fn to_base58(&self) -> String {
        bytes_to_address(&self.address)
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

/// A program-derived address and the bump seed that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAddress {
    pub address: [u8; 32],
    pub bump: u8,
}

/// Compute `SHA-256(base || seed || owner)`.
///
/// Rejects seeds longer than [`MAX_SEED_LEN`] and owners whose trailing
/// bytes spell the PDA marker, mirroring the ledger's own checks.
pub fn create_with_seed(
    base: &[u8; 32],
    seed: &str,
    owner: &[u8; 32],
) -> Result<[u8; 32], DeriveError> {
    if seed.len() > MAX_SEED_LEN {
        return Err(DeriveError::SeedTooLong {
            len: seed.len(),
            max: MAX_SEED_LEN,
        });
    }

    if owner.ends_with(PDA_MARKER) {
        return Err(DeriveError::IllegalOwner);
    }

    let mut hasher = Sha256::new();
    hasher.update(base);
    hasher.update(seed.as_bytes());
    hasher.update(owner);
    Ok(hasher.finalize().into())
}

/// Derive the seed address for `(base, seed, owner)` and keep the inputs.
pub fn derive_account_address(
    base: &[u8; 32],
    seed: &str,
    owner: &[u8; 32],
) -> Result<DerivedAddress, DeriveError> {
    let address = create_with_seed(base, seed, owner)?;
    Ok(DerivedAddress {
        base: *base,
        seed: seed.to_owned(),
        owner: *owner,
        address,
    })
}

/// Derive the associated token account address for a wallet + mint pair.
///
/// Seeds: `[wallet, token_program_id, mint]` under the ATA program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], DeriveError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|pda| pda.address)
}

/// Find the first off-curve program address, trying bump seeds 255 down to 0.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<ProgramAddress, DeriveError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DeriveError::MaxSeedLengthExceeded(format!(
            "{} seeds, maximum is {MAX_SEEDS}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(DeriveError::MaxSeedLengthExceeded(format!(
            "seed of {} bytes, maximum is {MAX_SEED_LEN}",
            seed.len()
        )));
    }

    for bump in (0u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, bump, program_id) {
            return Ok(ProgramAddress { address, bump });
        }
    }

    Err(DeriveError::NoViableBump)
}

/// `None` when the hash lands on the curve (a private key could exist).
fn try_create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &[u8; 32],
) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();
    if is_on_curve(&hash) {
        return None;
    }
    Some(hash)
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{address_to_bytes, bytes_to_address};

    const BASE: [u8; 32] = [0x11; 32];
    const PROGRAM: [u8; 32] = [0x22; 32];

    // -- create_with_seed ---------------------------------------------------

    #[test]
    fn known_answer_default_keys() {
        let zero = [0u8; 32];
        let address = create_with_seed(&zero, "limber chicken: 4/45", &zero).unwrap();
        assert_eq!(
            bytes_to_address(&address),
            "9h1HyLCW5dZnBVap8C5egQ9Z6pHyjsh5MNy83iPqqRuq"
        );
    }

    #[test]
    fn matches_manual_sha256() {
        let mut hasher = Sha256::new();
        hasher.update(BASE);
        hasher.update(b"lollll");
        hasher.update(PROGRAM);
        let expected: [u8; 32] = hasher.finalize().into();

        assert_eq!(create_with_seed(&BASE, "lollll", &PROGRAM).unwrap(), expected);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_account_address(&BASE, "lollll", &PROGRAM).unwrap();
        let b = derive_account_address(&BASE, "lollll", &PROGRAM).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_input_changes_the_address() {
        let reference = create_with_seed(&BASE, "lollll", &PROGRAM).unwrap();

        let other_base = create_with_seed(&[0x12; 32], "lollll", &PROGRAM).unwrap();
        let other_seed = create_with_seed(&BASE, "lolllm", &PROGRAM).unwrap();
        let other_owner = create_with_seed(&BASE, "lollll", &[0x23; 32]).unwrap();

        assert_ne!(reference, other_base);
        assert_ne!(reference, other_seed);
        assert_ne!(reference, other_owner);
    }

    #[test]
    fn seeds_over_limit_rejected() {
        let seed = "x".repeat(MAX_SEED_LEN + 1);
        let err = create_with_seed(&BASE, &seed, &PROGRAM).unwrap_err();
        assert_eq!(
            err,
            DeriveError::SeedTooLong {
                len: 33,
                max: MAX_SEED_LEN
            }
        );
    }

    #[test]
    fn seed_at_limit_accepted() {
        let seed = "x".repeat(MAX_SEED_LEN);
        assert!(create_with_seed(&BASE, &seed, &PROGRAM).is_ok());
    }

    #[test]
    fn empty_seed_accepted() {
        assert!(create_with_seed(&BASE, "", &PROGRAM).is_ok());
    }

    #[test]
    fn owner_with_pda_marker_rejected() {
        let mut owner = [0u8; 32];
        owner[32 - PDA_MARKER.len()..].copy_from_slice(PDA_MARKER);
        assert_eq!(
            create_with_seed(&BASE, "lollll", &owner),
            Err(DeriveError::IllegalOwner)
        );
    }

    #[test]
    fn derived_address_displays_as_base58() {
        let derived = derive_account_address(&BASE, "lollll", &PROGRAM).unwrap();
        assert_eq!(derived.to_string(), bytes_to_address(&derived.address));
        assert_eq!(derived.seed, "lollll");
        assert_eq!(derived.base, BASE);
        assert_eq!(derived.owner, PROGRAM);
    }

    // -- program-derived addresses ------------------------------------------

    #[test]
    fn pda_is_off_curve() {
        let ata = derive_associated_token_address(&[0xAA; 32], &[0xBB; 32]).unwrap();
        assert!(!is_on_curve(&ata));
    }

    #[test]
    fn pda_depends_on_wallet_and_mint() {
        let a = derive_associated_token_address(&[0x01; 32], &[0xFF; 32]).unwrap();
        let b = derive_associated_token_address(&[0x02; 32], &[0xFF; 32]).unwrap();
        let c = derive_associated_token_address(&[0x01; 32], &[0xFE; 32]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn pda_reports_bump_that_reproduces_it() {
        let seeds: [&[u8]; 1] = [b"authentik"];
        let pda = find_program_address(&seeds, &PROGRAM).unwrap();
        assert_eq!(
            try_create_program_address(&seeds, pda.bump, &PROGRAM),
            Some(pda.address)
        );
    }

    #[test]
    fn pda_rejects_long_seed() {
        let long = [0u8; MAX_SEED_LEN + 1];
        let err = find_program_address(&[&long], &PROGRAM).unwrap_err();
        assert!(matches!(err, DeriveError::MaxSeedLengthExceeded(_)));
    }

    #[test]
    fn pda_rejects_too_many_seeds() {
        let seed: &[u8] = b"s";
        let seeds = vec![seed; MAX_SEEDS + 1];
        assert!(find_program_address(&seeds, &PROGRAM).is_err());
    }

    #[test]
    fn basepoint_is_on_curve() {
        let mut basepoint = [0x66u8; 32];
        basepoint[0] = 0x58;
        assert!(is_on_curve(&basepoint));
    }

    #[test]
    fn token_program_constants_decode() {
        assert_eq!(
            address_to_bytes("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA").unwrap(),
            TOKEN_PROGRAM_ID
        );
        assert_eq!(
            address_to_bytes("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL").unwrap(),
            ASSOCIATED_TOKEN_PROGRAM_ID
        );
    }
}
