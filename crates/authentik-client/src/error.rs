use std::fmt;

use authentik_record::RecordError;
use authentik_sol::{DeriveError, SolError};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Workflow steps, used to report where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckProgram,
    PlanSpace,
    EstablishPayer,
    DeriveAddress,
    EnsureAccount,
    WriteRecord,
    ReadRecord,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CheckProgram => "check program",
            Step::PlanSpace => "plan account space",
            Step::EstablishPayer => "establish payer",
            Step::DeriveAddress => "derive account address",
            Step::EnsureAccount => "ensure account",
            Step::WriteRecord => "write record",
            Step::ReadRecord => "read record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("solana error: {0}")]
    Sol(#[from] SolError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("no account found at {0}")]
    AccountNotFound(String),

    #[error("program {program} is not deployed: {reason}")]
    ProgramNotDeployed { program: String, reason: String },

    #[error("deadline passed before {0}")]
    Cancelled(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        source: Box<ClientError>,
    },
}

impl From<DeriveError> for ClientError {
    fn from(e: DeriveError) -> Self {
        ClientError::Sol(SolError::Derive(e))
    }
}

impl ClientError {
    /// Tag this error with the step that produced it.
    pub fn at(self, step: Step) -> Self {
        ClientError::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The underlying error with any step tags removed.
    pub fn root(&self) -> &ClientError {
        match self {
            ClientError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// The step this error was tagged with, if any.
    pub fn step(&self) -> Option<Step> {
        match self {
            ClientError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_names_step_and_cause() {
        let err = ClientError::AccountNotFound("abc".into()).at(Step::ReadRecord);
        assert_eq!(err.to_string(), "read record failed: no account found at abc");
        assert_eq!(err.step(), Some(Step::ReadRecord));
        assert!(matches!(err.root(), ClientError::AccountNotFound(_)));
    }

    #[test]
    fn derive_error_converts() {
        let err: ClientError = DeriveError::SeedTooLong { len: 33, max: 32 }.into();
        assert!(matches!(
            err,
            ClientError::Sol(SolError::Derive(DeriveError::SeedTooLong { .. }))
        ));
    }

    #[test]
    fn ledger_error_passes_through() {
        let err: ClientError = LedgerError::Transport("connection reset".into()).into();
        assert_eq!(
            err.to_string(),
            "ledger error: transport failure: connection reset"
        );
    }

    #[test]
    fn program_not_deployed_display() {
        let err = ClientError::ProgramNotDeployed {
            program: "Prog111".into(),
            reason: "program account is not executable".into(),
        };
        assert_eq!(
            err.to_string(),
            "program Prog111 is not deployed: program account is not executable"
        );
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let err = ClientError::Cancelled("create account".into()).at(Step::EnsureAccount);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "deadline passed before create account");
    }
}
