use thiserror::Error;

/// Address derivation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("seed is {len} bytes, maximum is {max}")]
    SeedTooLong { len: usize, max: usize },

    #[error("owner ends with the program-derived address marker")]
    IllegalOwner,

    #[error("program address seeds exceed limits: {0}")]
    MaxSeedLengthExceeded(String),

    #[error("no bump seed yields an off-curve program address")]
    NoViableBump,
}

/// Solana primitive errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("keypair file error: {0}")]
    KeypairFile(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("derivation error: {0}")]
    Derive(#[from] DeriveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_seed_too_long() {
        let err = DeriveError::SeedTooLong { len: 40, max: 32 };
        assert_eq!(err.to_string(), "seed is 40 bytes, maximum is 32");
    }

    #[test]
    fn display_invalid_address() {
        let err = SolError::InvalidAddress("bad decode".into());
        assert_eq!(err.to_string(), "invalid address: bad decode");
    }

    #[test]
    fn derive_error_converts_into_sol_error() {
        let err: SolError = DeriveError::IllegalOwner.into();
        assert!(matches!(err, SolError::Derive(DeriveError::IllegalOwner)));
        assert!(err.to_string().starts_with("derivation error:"));
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(SolError::InvalidKeypair("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
