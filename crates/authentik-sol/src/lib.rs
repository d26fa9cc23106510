//! Solana primitives for the Authentik client.
//!
//! Covers the pieces the client needs without pulling in `solana-sdk`:
//! Base58 addresses, `create_with_seed` and program-derived address
//! derivation, Ed25519 keypairs (including the Solana CLI keypair file
//! format), and the System Program `CreateAccountWithSeed` instruction wire
//! format.

pub mod address;
pub mod derive;
pub mod error;
pub mod keypair;
pub mod system;

pub use address::{address_to_bytes, bytes_to_address, validate_address};
pub use derive::{
    create_with_seed, derive_account_address, derive_associated_token_address,
    find_program_address, DerivedAddress, ProgramAddress, ASSOCIATED_TOKEN_PROGRAM_ID,
    MAX_SEEDS, MAX_SEED_LEN, TOKEN_PROGRAM_ID,
};
pub use error::{DeriveError, SolError};
pub use keypair::{read_keypair_file, write_keypair_file, Keypair};
pub use system::{
    build_create_account_with_seed, CreateAccountWithSeedArgs, SolAccountMeta, SolInstruction,
    SYSTEM_PROGRAM_ID,
};
