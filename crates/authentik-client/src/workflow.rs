//! Record account workflow.
//!
//! ```text
//! check_program -> plan space -> establish_payer -> derive address
//!   -> ensure_account (Unchecked -> Exists | Absent -> Created)
//!   -> write_record -> read_record
//! ```
//!
//! Each step is one or more blocking ledger round-trips. The first failure
//! aborts the run; nothing is retried or rolled back.

use authentik_record::{decode, encode, AccountRecord, RecordSizePlan};
use authentik_sol::{
    build_create_account_with_seed, bytes_to_address, derive_account_address,
    derive_associated_token_address, DerivedAddress,
};
use tracing::{debug, info, warn};

use crate::context::ClientContext;
use crate::error::{ClientError, Step};
use crate::ledger::LedgerClient;
use crate::program::build_set_record;

/// Where an account stands in the create-if-absent state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Unchecked,
    Exists,
    Absent,
    Created,
}

/// Outcome of a full [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub account: DerivedAddress,
    /// `Created` on the first run for an address, `Exists` afterwards.
    pub state: AccountState,
    pub plan: RecordSizePlan,
    pub payer_balance: u64,
    pub signature: String,
    /// The record as read back from the ledger.
    pub record: AccountRecord,
    /// The payer wallet's token account for the record's mint.
    pub token_account: Option<[u8; 32]>,
}

/// Require the Authentik program to be deployed and executable.
pub fn check_program<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
) -> Result<(), ClientError> {
    let program = bytes_to_address(&ctx.program_id);
    match ctx.ledger.get_account_info(&ctx.program_id)? {
        None => Err(ClientError::ProgramNotDeployed {
            program,
            reason: "program account not found".into(),
        }),
        Some(info) if !info.executable => Err(ClientError::ProgramNotDeployed {
            program,
            reason: "program account is not executable".into(),
        }),
        Some(_) => {
            debug!(%program, "program is deployed");
            Ok(())
        }
    }
}

/// Top the payer up to the reserve for `plan` plus the fee budget.
///
/// Returns the payer balance once funded.
pub fn establish_payer<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    plan: &RecordSizePlan,
) -> Result<u64, ClientError> {
    let payer = ctx.payer_address();
    let needed = ctx
        .ledger
        .compute_minimum_reserve(plan.space)?
        .saturating_add(ctx.funding.fee_budget());

    let mut balance = ctx.ledger.get_balance(&payer)?;
    if balance < needed {
        ctx.check_deadline("request funds")?;
        warn!(
            payer = %bytes_to_address(&payer),
            balance,
            needed,
            "payer underfunded, requesting funds"
        );
        let receipt = ctx.ledger.request_funds(&payer, needed - balance)?;
        ctx.ledger.await_confirmation(&receipt)?;
        balance = ctx.ledger.get_balance(&payer)?;
    }

    info!(payer = %bytes_to_address(&payer), balance, "payer ready");
    Ok(balance)
}

/// Query the ledger for `address`: `Exists` or `Absent`.
pub fn probe_account<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    address: &[u8; 32],
) -> Result<AccountState, ClientError> {
    Ok(match ctx.ledger.get_account_info(address)? {
        Some(_) => AccountState::Exists,
        None => AccountState::Absent,
    })
}

/// Create the account at `derived` unless it already exists.
///
/// Returns `Exists` without submitting anything when an account is already
/// there, otherwise `Created` after exactly one create submission. A create
/// that loses a race to another client fails with the ledger's error.
pub fn ensure_account<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    derived: &DerivedAddress,
    plan: &RecordSizePlan,
) -> Result<AccountState, ClientError> {
    let address = derived.to_base58();

    let mut state = AccountState::Unchecked;
    while state == AccountState::Unchecked || state == AccountState::Absent {
        state = match state {
            AccountState::Unchecked => match ctx.ledger.get_account_info(&derived.address)? {
                Some(existing) => {
                    if existing.owner != ctx.program_id {
                        warn!(
                            %address,
                            owner = %bytes_to_address(&existing.owner),
                            "existing account is not owned by the program"
                        );
                    }
                    if existing.data.len() < plan.space {
                        warn!(
                            %address,
                            available = existing.data.len(),
                            needed = plan.space,
                            "existing account is smaller than the planned record"
                        );
                    }
                    AccountState::Exists
                }
                None => AccountState::Absent,
            },
            AccountState::Absent => {
                create_account(ctx, derived, plan)?;
                AccountState::Created
            }
            done => done,
        };
        debug!(%address, ?state, "account state");
    }

    info!(%address, ?state, "account ready");
    Ok(state)
}

fn create_account<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    derived: &DerivedAddress,
    plan: &RecordSizePlan,
) -> Result<(), ClientError> {
    let lamports = ctx.ledger.compute_minimum_reserve(plan.space)?;
    let ix = build_create_account_with_seed(
        &ctx.payer_address(),
        derived,
        lamports,
        plan.space as u64,
    );

    ctx.check_deadline("create account")?;
    info!(
        address = %derived,
        space = plan.space,
        lamports,
        "creating record account"
    );
    ctx.ledger.submit_transaction(&[ix], &[&ctx.payer])?;
    Ok(())
}

/// Overwrite the record stored at `address`.
pub fn write_record<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    address: &[u8; 32],
    record: &AccountRecord,
) -> Result<String, ClientError> {
    let ix = build_set_record(&ctx.program_id, address, record, &ctx.layout)?;

    ctx.check_deadline("write record")?;
    info!(address = %bytes_to_address(address), uri = %record.uri, "writing record");
    let signature = ctx.ledger.submit_transaction(&[ix], &[&ctx.payer])?;
    Ok(signature)
}

/// Read and decode the record stored at `address`.
pub fn read_record<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    address: &[u8; 32],
) -> Result<AccountRecord, ClientError> {
    let info = ctx
        .ledger
        .get_account_info(address)?
        .ok_or_else(|| ClientError::AccountNotFound(bytes_to_address(address)))?;

    Ok(decode(&info.data, &ctx.layout)?)
}

/// Run the whole workflow for `record`, stopping at the first failing step.
pub fn run<L: LedgerClient + ?Sized>(
    ctx: &ClientContext<'_, L>,
    record: &AccountRecord,
) -> Result<RunReport, ClientError> {
    check_program(ctx).map_err(|e| e.at(Step::CheckProgram))?;

    // Validate the record and derive addresses before any funds move.
    let plan = ctx
        .layout
        .plan(record)
        .and_then(|plan| encode(record, &ctx.layout).map(|_| plan))
        .map_err(|e| ClientError::from(e).at(Step::PlanSpace))?;

    let payer = ctx.payer_address();
    let account = derive_account_address(&payer, &ctx.seed, &ctx.program_id)
        .map_err(|e| ClientError::from(e).at(Step::DeriveAddress))?;
    let token_account = record
        .mint
        .map(|mint| derive_associated_token_address(&payer, &mint))
        .transpose()
        .map_err(|e| ClientError::from(e).at(Step::DeriveAddress))?;

    let payer_balance = establish_payer(ctx, &plan).map_err(|e| e.at(Step::EstablishPayer))?;

    let state = ensure_account(ctx, &account, &plan).map_err(|e| e.at(Step::EnsureAccount))?;
    let signature =
        write_record(ctx, &account.address, record).map_err(|e| e.at(Step::WriteRecord))?;
    let stored = read_record(ctx, &account.address).map_err(|e| e.at(Step::ReadRecord))?;

    info!(address = %account, ?state, uri = %stored.uri, "record stored");
    Ok(RunReport {
        account,
        state,
        plan,
        payer_balance,
        signature,
        record: stored,
        token_account,
    })
}
