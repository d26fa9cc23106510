//! Ed25519 keypairs and the Solana CLI keypair file format.
//!
//! A keypair file is a JSON array of 64 integers: the 32-byte secret seed
//! followed by the 32-byte public key.

use std::fmt;
use std::fs;
use std::path::Path;

use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::address::bytes_to_address;
use crate::error::SolError;

/// An Ed25519 signing keypair. The secret is zeroized on drop.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Build a keypair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse the 64-byte `secret || public` form.
    ///
    /// Fails if the public half does not belong to the secret half.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let arr: &[u8; 64] = bytes.try_into().map_err(|_| {
            SolError::InvalidKeypair(format!("expected 64 bytes, got {}", bytes.len()))
        })?;

        let signing_key = SigningKey::from_keypair_bytes(arr)
            .map_err(|e| SolError::InvalidKeypair(format!("public key mismatch: {e}")))?;

        Ok(Self { signing_key })
    }

    /// The 64-byte `secret || public` form written to keypair files.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn pubkey(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &bytes_to_address(&self.pubkey()))
            .finish_non_exhaustive()
    }
}

/// Read a keypair from a Solana CLI keypair file.
pub fn read_keypair_file(path: impl AsRef<Path>) -> Result<Keypair, SolError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| SolError::KeypairFile(format!("{}: {e}", path.display())))?;

    let mut bytes: Vec<u8> = serde_json::from_str(&contents)
        .map_err(|e| SolError::KeypairFile(format!("{}: {e}", path.display())))?;

    let keypair = Keypair::from_bytes(&bytes);
    bytes.zeroize();
    keypair
}

/// Write a keypair in the Solana CLI keypair file format.
pub fn write_keypair_file(keypair: &Keypair, path: impl AsRef<Path>) -> Result<(), SolError> {
    let path = path.as_ref();
    let mut bytes = keypair.to_bytes();
    let json = serde_json::to_string(&bytes.to_vec())
        .map_err(|e| SolError::KeypairFile(format!("{}: {e}", path.display())));
    bytes.zeroize();

    fs::write(path, json?)
        .map_err(|e| SolError::KeypairFile(format!("{}: {e}", path.display())))
}
