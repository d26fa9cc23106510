//! The ledger-client boundary.
//!
//! Everything that talks to the cluster goes through [`LedgerClient`]. The
//! workflow never retries; errors come back exactly as the client reported
//! them.

use authentik_sol::{Keypair, SolInstruction};
use thiserror::Error;

/// Ledger and transport errors, surfaced to callers unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("account {0} already in use")]
    AccountAlreadyInUse(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("missing signature for {0}")]
    MissingSignature(String),

    #[error("account data too small: need {needed} bytes, account has {available}")]
    AccountDataTooSmall { needed: usize, available: usize },

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("account {0} is not owned by the invoked program")]
    IncorrectProgramId(String),

    #[error("unknown receipt {0}")]
    UnknownReceipt(String),
}

/// Snapshot of an account as returned by a storage query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub data: Vec<u8>,
    pub owner: [u8; 32],
    pub executable: bool,
}

/// Handle for a funding request that still has to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Receipt {
    pub signature: String,
}

/// Operations the workflow needs from a ledger client.
///
/// Every call is one blocking request/response round-trip.
pub trait LedgerClient {
    /// Ask the faucet for `lamports` to be credited to `address`.
    fn request_funds(&self, address: &[u8; 32], lamports: u64) -> Result<Receipt, LedgerError>;

    fn await_confirmation(&self, receipt: &Receipt) -> Result<(), LedgerError>;

    fn get_balance(&self, address: &[u8; 32]) -> Result<u64, LedgerError>;

    /// `None` when no account exists at `address`.
    fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, LedgerError>;

    /// Lamports an account of `size` data bytes must hold to be rent exempt.
    fn compute_minimum_reserve(&self, size: usize) -> Result<u64, LedgerError>;

    /// Submit one atomic transaction. The first signer pays the fee.
    ///
    /// Returns the transaction signature.
    fn submit_transaction(
        &self,
        instructions: &[SolInstruction],
        signers: &[&Keypair],
    ) -> Result<String, LedgerError>;
}
