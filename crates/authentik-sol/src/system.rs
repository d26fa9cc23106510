//! Instructions and the System Program `CreateAccountWithSeed` wire format.
//!
//! System Program instruction data is bincode: a little-endian `u32`
//! variant index followed by the variant's fields.
//!
//! ```text
//! CreateAccountWithSeed (index 3):
//!   index                   u32 LE
//!   base                    32 bytes
//!   seed_len                u64 LE
//!   seed                    u8 * seed_len (UTF-8)
//!   lamports                u64 LE
//!   space                   u64 LE
//!   owner                   32 bytes
//!
//! Accounts:
//!   0. funding account      signer, writable
//!   1. created account      writable
//!   2. base account         signer
//! ```

use crate::derive::DerivedAddress;
use crate::error::SolError;

/// The System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

const CREATE_ACCOUNT_WITH_SEED_IX_INDEX: u32 = 3;

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction addressed to a program, before transaction compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// Fields of `SystemInstruction::CreateAccountWithSeed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountWithSeedArgs {
    pub base: [u8; 32],
    pub seed: String,
    pub lamports: u64,
    pub space: u64,
    pub owner: [u8; 32],
}

impl CreateAccountWithSeedArgs {
    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + 32 + 8 + self.seed.len() + 8 + 8 + 32);
        data.extend_from_slice(&CREATE_ACCOUNT_WITH_SEED_IX_INDEX.to_le_bytes());
        data.extend_from_slice(&self.base);
        data.extend_from_slice(&(self.seed.len() as u64).to_le_bytes());
        data.extend_from_slice(self.seed.as_bytes());
        data.extend_from_slice(&self.lamports.to_le_bytes());
        data.extend_from_slice(&self.space.to_le_bytes());
        data.extend_from_slice(&self.owner);
        data
    }

    /// Parse instruction data produced by [`pack`](Self::pack).
    ///
    /// Trailing bytes are rejected.
    pub fn unpack(data: &[u8]) -> Result<Self, SolError> {
        let mut reader = Reader::new(data);

        let index = u32::from_le_bytes(reader.take_array::<4>()?);
        if index != CREATE_ACCOUNT_WITH_SEED_IX_INDEX {
            return Err(SolError::SerializationError(format!(
                "expected CreateAccountWithSeed (3), got instruction {index}"
            )));
        }

        let base = reader.take_array::<32>()?;
        let seed_len = u64::from_le_bytes(reader.take_array::<8>()?);
        let seed_len = usize::try_from(seed_len)
            .map_err(|_| SolError::SerializationError("seed length overflow".into()))?;
        let seed = std::str::from_utf8(reader.take(seed_len)?)
            .map_err(|e| SolError::SerializationError(format!("seed is not UTF-8: {e}")))?
            .to_owned();
        let lamports = u64::from_le_bytes(reader.take_array::<8>()?);
        let space = u64::from_le_bytes(reader.take_array::<8>()?);
        let owner = reader.take_array::<32>()?;

        if !reader.is_empty() {
            return Err(SolError::SerializationError(
                "trailing bytes after CreateAccountWithSeed".into(),
            ));
        }

        Ok(Self {
            base,
            seed,
            lamports,
            space,
            owner,
        })
    }
}

/// Build a `CreateAccountWithSeed` instruction for `derived`, funded by
/// `funding` and owned by `derived.owner`.
pub fn build_create_account_with_seed(
    funding: &[u8; 32],
    derived: &DerivedAddress,
    lamports: u64,
    space: u64,
) -> SolInstruction {
    let args = CreateAccountWithSeedArgs {
        base: derived.base,
        seed: derived.seed.clone(),
        lamports,
        space,
        owner: derived.owner,
    };

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*funding, true),
            SolAccountMeta::writable(derived.address, false),
            SolAccountMeta::readonly(derived.base, true),
        ],
        data: args.pack(),
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SolError> {
        if self.data.len() < len {
            return Err(SolError::SerializationError(format!(
                "unexpected end of data: needed {len} bytes, {} left",
                self.data.len()
            )));
        }
        let (head, rest) = self.data.split_at(len);
        self.data = rest;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_account_address;

    fn sample_args() -> CreateAccountWithSeedArgs {
        CreateAccountWithSeedArgs {
            base: [0x11; 32],
            seed: "lollll".into(),
            lamports: 1_000_000,
            space: 79,
            owner: [0x22; 32],
        }
    }

    #[test]
    fn packed_layout() {
        let data = sample_args().pack();

        assert_eq!(data.len(), 4 + 32 + 8 + 6 + 8 + 8 + 32);
        assert_eq!(&data[..4], &[3, 0, 0, 0]);
        assert_eq!(&data[4..36], &[0x11; 32]);
        assert_eq!(&data[36..44], &6u64.to_le_bytes());
        assert_eq!(&data[44..50], b"lollll");
        assert_eq!(&data[50..58], &1_000_000u64.to_le_bytes());
        assert_eq!(&data[58..66], &79u64.to_le_bytes());
        assert_eq!(&data[66..], &[0x22; 32]);
    }

    #[test]
    fn unpack_reverses_pack() {
        let args = sample_args();
        assert_eq!(CreateAccountWithSeedArgs::unpack(&args.pack()).unwrap(), args);
    }

    #[test]
    fn unpack_rejects_other_instruction() {
        let mut data = sample_args().pack();
        data[0] = 2;
        let err = CreateAccountWithSeedArgs::unpack(&data).unwrap_err();
        assert!(err.to_string().contains("got instruction 2"));
    }

    #[test]
    fn unpack_rejects_truncated_data() {
        let data = sample_args().pack();
        assert!(CreateAccountWithSeedArgs::unpack(&data[..data.len() - 1]).is_err());
    }

    #[test]
    fn unpack_rejects_trailing_bytes() {
        let mut data = sample_args().pack();
        data.push(0);
        assert!(CreateAccountWithSeedArgs::unpack(&data).is_err());
    }

    #[test]
    fn instruction_account_roles() {
        let payer = [0x11; 32];
        let derived = derive_account_address(&payer, "lollll", &[0x22; 32]).unwrap();
        let ix = build_create_account_with_seed(&payer, &derived, 5_000, 79);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(ix.accounts.len(), 3);

        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, derived.address);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert!(ix.accounts[2].is_signer && !ix.accounts[2].is_writable);

        let args = CreateAccountWithSeedArgs::unpack(&ix.data).unwrap();
        assert_eq!(args.seed, "lollll");
        assert_eq!(args.owner, derived.owner);
        assert_eq!(args.space, 79);
    }
}
