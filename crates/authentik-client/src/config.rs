//! Client configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) works.
//!
//! ```json
//! {
//!   "payer_keypair_path": "~/.config/solana/id.json",
//!   "program_id": "<base58 program id>",
//!   "account_seed": "lollll",
//!   "max_uri_len": 43,
//!   "with_mint": false,
//!   "funding": { "lamports_per_signature": 5000, "signature_budget": 100 },
//!   "timeout_secs": 30
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use authentik_record::{RecordLayout, DEFAULT_MAX_URI_LEN};
use authentik_sol::{address_to_bytes, validate_address, MAX_SEED_LEN};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Seed the record account is derived with unless configured otherwise.
pub const DEFAULT_ACCOUNT_SEED: &str = "lollll";

/// How much the payer must hold before the workflow spends anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingPolicy {
    pub lamports_per_signature: u64,
    /// Signatures' worth of fees kept on top of the account reserve.
    pub signature_budget: u64,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self {
            lamports_per_signature: 5_000,
            signature_budget: 100,
        }
    }
}

impl FundingPolicy {
    pub fn fee_budget(&self) -> u64 {
        self.lamports_per_signature
            .saturating_mul(self.signature_budget)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Solana CLI keypair file for the payer. Generated on first use when
    /// missing; an ephemeral keypair is used when unset.
    pub payer_keypair_path: Option<PathBuf>,
    /// Base58 id of the deployed Authentik program.
    pub program_id: Option<String>,
    pub account_seed: String,
    pub max_uri_len: usize,
    pub with_mint: bool,
    pub funding: FundingPolicy,
    /// Deadline for the whole run, checked before each submission.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            payer_keypair_path: None,
            program_id: None,
            account_seed: DEFAULT_ACCOUNT_SEED.to_owned(),
            max_uri_len: DEFAULT_MAX_URI_LEN,
            with_mint: false,
            funding: FundingPolicy::default(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.account_seed.len() > MAX_SEED_LEN {
            return Err(ClientError::Config(format!(
                "account_seed is {} bytes, maximum is {MAX_SEED_LEN}",
                self.account_seed.len()
            )));
        }
        if let Some(id) = &self.program_id {
            validate_address(id).map_err(|e| ClientError::Config(format!("program_id: {e}")))?;
        }
        Ok(())
    }

    pub fn layout(&self) -> RecordLayout {
        RecordLayout {
            max_uri_len: self.max_uri_len,
            with_mint: self.with_mint,
        }
    }

    pub fn program_id(&self) -> Result<[u8; 32], ClientError> {
        let id = self
            .program_id
            .as_deref()
            .ok_or_else(|| ClientError::Config("program_id is not set".into()))?;
        address_to_bytes(id).map_err(|e| ClientError::Config(format!("program_id: {e}")))
    }
}
