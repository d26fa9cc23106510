//! Per-run client context.

use std::path::Path;
use std::time::{Duration, Instant};

use authentik_record::RecordLayout;
use authentik_sol::{bytes_to_address, read_keypair_file, write_keypair_file, Keypair};
use tracing::info;

use crate::config::{ClientConfig, FundingPolicy, DEFAULT_ACCOUNT_SEED};
use crate::error::ClientError;
use crate::ledger::LedgerClient;

/// Everything one workflow run needs: the ledger handle, the payer, the
/// program that owns record accounts, and the run's settings.
pub struct ClientContext<'a, L: LedgerClient + ?Sized> {
    pub ledger: &'a L,
    pub payer: Keypair,
    pub program_id: [u8; 32],
    pub seed: String,
    pub layout: RecordLayout,
    pub funding: FundingPolicy,
    /// Submissions are refused once this instant has passed.
    pub deadline: Option<Instant>,
}

impl<'a, L: LedgerClient + ?Sized> ClientContext<'a, L> {
    pub fn new(ledger: &'a L, payer: Keypair, program_id: [u8; 32]) -> Self {
        Self {
            ledger,
            payer,
            program_id,
            seed: DEFAULT_ACCOUNT_SEED.to_owned(),
            layout: RecordLayout::default(),
            funding: FundingPolicy::default(),
            deadline: None,
        }
    }

    /// Build a context from `config`, loading or generating the payer.
    pub fn from_config(ledger: &'a L, config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let program_id = config.program_id()?;
        let payer = load_or_generate_payer(config.payer_keypair_path.as_deref())?;

        let mut ctx = Self::new(ledger, payer, program_id)
            .with_seed(config.account_seed.clone())
            .with_layout(config.layout());
        ctx.funding = config.funding;
        if let Some(secs) = config.timeout_secs {
            ctx = ctx.with_timeout(Duration::from_secs(secs));
        }
        Ok(ctx)
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn payer_address(&self) -> [u8; 32] {
        self.payer.pubkey()
    }

    /// Fail with [`ClientError::Cancelled`] if the deadline has passed.
    pub fn check_deadline(&self, action: &str) -> Result<(), ClientError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(ClientError::Cancelled(action.to_owned()))
            }
            _ => Ok(()),
        }
    }
}

/// Load the payer keypair, or create one.
///
/// With a path, an existing file is read and a missing one is generated and
/// written, so later runs reuse the same payer and therefore find the same
/// derived accounts. Without a path the keypair is ephemeral.
pub fn load_or_generate_payer(path: Option<&Path>) -> Result<Keypair, ClientError> {
    let Some(path) = path else {
        let payer = Keypair::generate();
        info!(payer = %bytes_to_address(&payer.pubkey()), "generated ephemeral payer");
        return Ok(payer);
    };

    if path.exists() {
        return Ok(read_keypair_file(path)?);
    }

    let payer = Keypair::generate();
    write_keypair_file(&payer, path)?;
    info!(
        payer = %bytes_to_address(&payer.pubkey()),
        path = %path.display(),
        "generated payer keypair"
    );
    Ok(payer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_ledger::MemoryLedger;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("authentik-client-{}-{name}", std::process::id()))
    }

    #[test]
    fn payer_file_is_created_then_reused() {
        let path = temp_path("payer.json");
        let _ = std::fs::remove_file(&path);

        let first = load_or_generate_payer(Some(&path)).unwrap();
        let second = load_or_generate_payer(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(first.pubkey(), second.pubkey());
    }

    #[test]
    fn ephemeral_payers_differ() {
        let a = load_or_generate_payer(None).unwrap();
        let b = load_or_generate_payer(None).unwrap();
        assert_ne!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn context_from_config() {
        let ledger = MemoryLedger::new();
        let config = ClientConfig {
            program_id: Some(bytes_to_address(&[0x22; 32])),
            account_seed: "other".into(),
            with_mint: true,
            timeout_secs: Some(60),
            ..ClientConfig::default()
        };

        let ctx = ClientContext::from_config(&ledger, &config).unwrap();
        assert_eq!(ctx.program_id, [0x22; 32]);
        assert_eq!(ctx.seed, "other");
        assert!(ctx.layout.with_mint);
        assert!(ctx.deadline.is_some());
        assert!(ctx.check_deadline("anything").is_ok());
    }

    #[test]
    fn context_requires_program_id() {
        let ledger = MemoryLedger::new();
        let result = ClientContext::from_config(&ledger, &ClientConfig::default());
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn passed_deadline_cancels() {
        let ledger = MemoryLedger::new();
        let ctx = ClientContext::new(&ledger, Keypair::from_seed(&[1; 32]), [2; 32])
            .with_deadline(Instant::now());
        let err = ctx.check_deadline("create account").unwrap_err();
        assert_eq!(err.to_string(), "deadline passed before create account");
    }
}
