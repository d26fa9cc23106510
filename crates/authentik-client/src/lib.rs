//! Authentik client workflow.
//!
//! Composes the record codec and the address deriver over a
//! [`LedgerClient`]: check that the Authentik program is deployed, fund the
//! payer, create the seed-derived record account if it is absent, write the
//! record and read it back.
//!
//! All state lives in an explicit [`ClientContext`]; nothing is global.

pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod memory_ledger;
pub mod program;
pub mod workflow;

pub use authentik_record::{
    decode, encode, register_uri, AccountRecord, RecordError, RecordLayout, RecordSizePlan,
};
pub use authentik_sol::{derive_account_address, DerivedAddress, Keypair};

pub use config::{ClientConfig, FundingPolicy};
pub use context::{load_or_generate_payer, ClientContext};
pub use error::{ClientError, Step};
pub use ledger::{AccountInfo, LedgerClient, LedgerError, Receipt};
pub use memory_ledger::MemoryLedger;
pub use program::{build_set_record, AuthentikInstruction};
pub use workflow::{
    check_program, ensure_account, establish_payer, probe_account, read_record, run,
    write_record, AccountState, RunReport,
};
