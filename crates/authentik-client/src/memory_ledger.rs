//! In-process ledger.
//!
//! Implements [`LedgerClient`] with the subset of ledger semantics the
//! Authentik workflow touches: balances and faucet requests, rent-exempt
//! minimums, signature checks, System Program `CreateAccountWithSeed`, and
//! the Authentik program's `SetRecord`. Transactions are atomic: either
//! every instruction applies or none does.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use authentik_sol::{
    address_to_bytes, bytes_to_address, create_with_seed, CreateAccountWithSeedArgs, Keypair,
    SolInstruction, SYSTEM_PROGRAM_ID,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::ledger::{AccountInfo, LedgerClient, LedgerError, Receipt};
use crate::program::AuthentikInstruction;

/// Fee charged per transaction signature.
pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;

/// Per-account bookkeeping bytes counted towards rent.
const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;
const LAMPORTS_PER_BYTE_YEAR: u64 = 3_480;
const EXEMPTION_THRESHOLD_YEARS: u64 = 2;

/// Owner recorded for deployed program accounts.
const BPF_LOADER_UPGRADEABLE: &str = "BPFLoaderUpgradeab1e11111111111111111111111";

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<[u8; 32], AccountInfo>,
    programs: HashSet<[u8; 32]>,
    /// Faucet receipts and whether they have been confirmed.
    receipts: HashMap<String, bool>,
    submitted: usize,
    fund_requests: usize,
    sequence: u64,
    offline: bool,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `program_id` as an executable Authentik program.
    pub fn deploy_program(&self, program_id: [u8; 32]) -> Result<(), LedgerError> {
        let loader = address_to_bytes(BPF_LOADER_UPGRADEABLE)
            .map_err(|e| LedgerError::InvalidInstruction(e.to_string()))?;
        let mut state = self.lock()?;
        state.programs.insert(program_id);
        state.accounts.insert(
            program_id,
            AccountInfo {
                lamports: minimum_balance(36),
                data: Vec::new(),
                owner: loader,
                executable: true,
            },
        );
        info!(program = %bytes_to_address(&program_id), "program deployed");
        Ok(())
    }

    /// Place an arbitrary account, replacing whatever was there.
    pub fn insert_account(
        &self,
        address: [u8; 32],
        account: AccountInfo,
    ) -> Result<(), LedgerError> {
        self.lock()?.accounts.insert(address, account);
        Ok(())
    }

    /// While offline every call fails with [`LedgerError::Transport`].
    pub fn set_offline(&self, offline: bool) -> Result<(), LedgerError> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Transactions submitted so far, successful or not.
    pub fn submitted_transactions(&self) -> usize {
        self.lock().map(|s| s.submitted).unwrap_or_default()
    }

    /// Faucet requests received so far.
    pub fn fund_requests(&self) -> usize {
        self.lock().map(|s| s.fund_requests).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Transport("ledger state poisoned".into()))
    }

    /// Lock and fail fast when offline.
    fn connect(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        let state = self.lock()?;
        if state.offline {
            return Err(LedgerError::Transport("ledger unreachable".into()));
        }
        Ok(state)
    }
}

impl LedgerClient for MemoryLedger {
    fn request_funds(&self, address: &[u8; 32], lamports: u64) -> Result<Receipt, LedgerError> {
        let mut state = self.connect()?;
        state.fund_requests += 1;
        state.sequence += 1;

        let account = state.accounts.entry(*address).or_insert_with(|| AccountInfo {
            lamports: 0,
            data: Vec::new(),
            owner: SYSTEM_PROGRAM_ID,
            executable: false,
        });
        account.lamports = account.lamports.saturating_add(lamports);

        let signature = receipt_signature(address, lamports, state.sequence);
        state.receipts.insert(signature.clone(), false);
        debug!(to = %bytes_to_address(address), lamports, "faucet credited");
        Ok(Receipt { signature })
    }

    fn await_confirmation(&self, receipt: &Receipt) -> Result<(), LedgerError> {
        let mut state = self.connect()?;
        match state.receipts.get_mut(&receipt.signature) {
            Some(confirmed) => {
                *confirmed = true;
                Ok(())
            }
            None => Err(LedgerError::UnknownReceipt(receipt.signature.clone())),
        }
    }

    fn get_balance(&self, address: &[u8; 32]) -> Result<u64, LedgerError> {
        let state = self.connect()?;
        Ok(state.accounts.get(address).map(|a| a.lamports).unwrap_or(0))
    }

    fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, LedgerError> {
        let state = self.connect()?;
        Ok(state.accounts.get(address).cloned())
    }

    fn compute_minimum_reserve(&self, size: usize) -> Result<u64, LedgerError> {
        self.connect()?;
        Ok(minimum_balance(size))
    }

    fn submit_transaction(
        &self,
        instructions: &[SolInstruction],
        signers: &[&Keypair],
    ) -> Result<String, LedgerError> {
        let mut state = self.connect()?;
        state.submitted += 1;
        state.sequence += 1;

        if instructions.is_empty() {
            return Err(LedgerError::InvalidInstruction("empty transaction".into()));
        }
        let fee_payer = signers
            .first()
            .ok_or_else(|| LedgerError::MissingSignature("fee payer".into()))?;

        let signer_keys: Vec<[u8; 32]> = signers.iter().map(|k| k.pubkey()).collect();
        for meta in instructions.iter().flat_map(|ix| &ix.accounts) {
            if meta.is_signer && !signer_keys.contains(&meta.pubkey) {
                return Err(LedgerError::MissingSignature(bytes_to_address(&meta.pubkey)));
            }
        }

        // Work on a copy so a failing instruction leaves no trace.
        let mut accounts = state.accounts.clone();
        debit(
            &mut accounts,
            &fee_payer.pubkey(),
            LAMPORTS_PER_SIGNATURE * signers.len() as u64,
        )?;
        for ix in instructions {
            process_instruction(&mut accounts, &state.programs, ix)?;
        }
        state.accounts = accounts;

        let message = message_digest(instructions, state.sequence);
        let signature = bs58::encode(fee_payer.sign(&message)).into_string();
        debug!(%signature, instructions = instructions.len(), "transaction applied");
        Ok(signature)
    }
}

/// Rent-exempt minimum for an account holding `size` data bytes,
/// saturating at `u64::MAX` for sizes no account could have.
pub fn minimum_balance(size: usize) -> u64 {
    checked_minimum_balance(size).unwrap_or(u64::MAX)
}

fn checked_minimum_balance(size: usize) -> Option<u64> {
    u64::try_from(size)
        .ok()?
        .checked_add(ACCOUNT_STORAGE_OVERHEAD)?
        .checked_mul(LAMPORTS_PER_BYTE_YEAR)?
        .checked_mul(EXEMPTION_THRESHOLD_YEARS)
}

fn process_instruction(
    accounts: &mut HashMap<[u8; 32], AccountInfo>,
    programs: &HashSet<[u8; 32]>,
    ix: &SolInstruction,
) -> Result<(), LedgerError> {
    if ix.program_id == SYSTEM_PROGRAM_ID {
        return create_account_with_seed(accounts, ix);
    }
    if programs.contains(&ix.program_id) {
        return set_record(accounts, ix);
    }
    Err(LedgerError::InvalidInstruction(format!(
        "program {} is not deployed",
        bytes_to_address(&ix.program_id)
    )))
}

fn create_account_with_seed(
    accounts: &mut HashMap<[u8; 32], AccountInfo>,
    ix: &SolInstruction,
) -> Result<(), LedgerError> {
    let args = CreateAccountWithSeedArgs::unpack(&ix.data)
        .map_err(|e| LedgerError::InvalidInstruction(e.to_string()))?;

    let [funding, created, base] = match ix.accounts.as_slice() {
        [a, b, c, ..] => [a.pubkey, b.pubkey, c.pubkey],
        _ => {
            return Err(LedgerError::InvalidInstruction(
                "CreateAccountWithSeed needs funding, new and base accounts".into(),
            ))
        }
    };

    if base != args.base {
        return Err(LedgerError::InvalidInstruction(
            "base account does not match instruction base".into(),
        ));
    }
    let expected = create_with_seed(&args.base, &args.seed, &args.owner)
        .map_err(|e| LedgerError::InvalidInstruction(e.to_string()))?;
    if expected != created {
        return Err(LedgerError::InvalidInstruction(format!(
            "address {} does not match derived address {}",
            bytes_to_address(&created),
            bytes_to_address(&expected)
        )));
    }

    if accounts.contains_key(&created) {
        return Err(LedgerError::AccountAlreadyInUse(bytes_to_address(&created)));
    }

    let space = usize::try_from(args.space)
        .map_err(|_| LedgerError::InvalidInstruction("space overflows usize".into()))?;
    let minimum = checked_minimum_balance(space).ok_or_else(|| {
        LedgerError::InvalidInstruction(format!("space {space} has no rent-exempt minimum"))
    })?;
    if args.lamports < minimum {
        return Err(LedgerError::InsufficientFunds(format!(
            "{} lamports is below the rent-exempt minimum of {minimum}",
            args.lamports
        )));
    }

    debit(accounts, &funding, args.lamports)?;
    accounts.insert(
        created,
        AccountInfo {
            lamports: args.lamports,
            data: vec![0; space],
            owner: args.owner,
            executable: false,
        },
    );
    info!(address = %bytes_to_address(&created), space, "account created");
    Ok(())
}

fn set_record(
    accounts: &mut HashMap<[u8; 32], AccountInfo>,
    ix: &SolInstruction,
) -> Result<(), LedgerError> {
    let AuthentikInstruction::SetRecord { record } = AuthentikInstruction::unpack(&ix.data)?;

    let target = ix
        .accounts
        .first()
        .filter(|meta| meta.is_writable)
        .ok_or_else(|| {
            LedgerError::InvalidInstruction("SetRecord needs a writable record account".into())
        })?;

    let account = accounts.get_mut(&target.pubkey).ok_or_else(|| {
        LedgerError::InvalidInstruction(format!(
            "record account {} does not exist",
            bytes_to_address(&target.pubkey)
        ))
    })?;

    if account.owner != ix.program_id {
        return Err(LedgerError::IncorrectProgramId(bytes_to_address(&target.pubkey)));
    }
    if record.len() > account.data.len() {
        return Err(LedgerError::AccountDataTooSmall {
            needed: record.len(),
            available: account.data.len(),
        });
    }

    account.data.fill(0);
    account.data[..record.len()].copy_from_slice(&record);
    Ok(())
}

fn debit(
    accounts: &mut HashMap<[u8; 32], AccountInfo>,
    address: &[u8; 32],
    lamports: u64,
) -> Result<(), LedgerError> {
    let balance = accounts.get(address).map(|a| a.lamports).unwrap_or(0);
    let remaining = balance.checked_sub(lamports).ok_or_else(|| {
        LedgerError::InsufficientFunds(format!(
            "{} holds {balance} lamports, needs {lamports}",
            bytes_to_address(address)
        ))
    })?;

    if let Some(account) = accounts.get_mut(address) {
        account.lamports = remaining;
    }
    Ok(())
}

fn message_digest(instructions: &[SolInstruction], sequence: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    for ix in instructions {
        hasher.update(ix.program_id);
        for meta in &ix.accounts {
            hasher.update(meta.pubkey);
            hasher.update([meta.is_signer as u8, meta.is_writable as u8]);
        }
        hasher.update((ix.data.len() as u64).to_le_bytes());
        hasher.update(&ix.data);
    }
    hasher.finalize().into()
}

fn receipt_signature(address: &[u8; 32], lamports: u64, sequence: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"faucet");
    hasher.update(address);
    hasher.update(lamports.to_le_bytes());
    hasher.update(sequence.to_le_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    bs58::encode(digest).into_string()
}
