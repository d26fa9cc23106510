//! Authentik program instruction format.
//!
//! ```text
//! SetRecord:
//!   tag                     u8 = 0
//!   record                  encoded AccountRecord
//!
//! Accounts:
//!   0. record account       writable, owned by the program
//! ```

use authentik_record::{encode, AccountRecord, RecordError, RecordLayout};
use authentik_sol::{SolAccountMeta, SolInstruction};

use crate::ledger::LedgerError;

const SET_RECORD_TAG: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthentikInstruction {
    /// Overwrite the record account with an encoded record.
    SetRecord { record: Vec<u8> },
}

impl AuthentikInstruction {
    pub fn pack(&self) -> Vec<u8> {
        match self {
            AuthentikInstruction::SetRecord { record } => {
                let mut data = Vec::with_capacity(1 + record.len());
                data.push(SET_RECORD_TAG);
                data.extend_from_slice(record);
                data
            }
        }
    }

    pub fn unpack(data: &[u8]) -> Result<Self, LedgerError> {
        let (&tag, rest) = data
            .split_first()
            .ok_or_else(|| LedgerError::InvalidInstruction("empty instruction data".into()))?;

        match tag {
            SET_RECORD_TAG => Ok(AuthentikInstruction::SetRecord {
                record: rest.to_vec(),
            }),
            other => Err(LedgerError::InvalidInstruction(format!(
                "unknown Authentik instruction tag {other}"
            ))),
        }
    }
}

/// Build the instruction that stores `record` in `account`.
pub fn build_set_record(
    program_id: &[u8; 32],
    account: &[u8; 32],
    record: &AccountRecord,
    layout: &RecordLayout,
) -> Result<SolInstruction, RecordError> {
    let ix = AuthentikInstruction::SetRecord {
        record: encode(record, layout)?,
    };

    Ok(SolInstruction {
        program_id: *program_id,
        accounts: vec![SolAccountMeta::writable(*account, false)],
        data: ix.pack(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_record_data_is_tag_then_record() {
        let layout = RecordLayout::default();
        let ix = build_set_record(&[1; 32], &[2; 32], &AccountRecord::new("ab"), &layout).unwrap();

        assert_eq!(ix.program_id, [1; 32]);
        assert_eq!(ix.data, vec![0, 2, 0, 0, 0, b'a', b'b']);
        assert_eq!(ix.accounts, vec![SolAccountMeta::writable([2; 32], false)]);
    }

    #[test]
    fn unpack_reverses_pack() {
        let ix = AuthentikInstruction::SetRecord {
            record: vec![1, 2, 3],
        };
        assert_eq!(AuthentikInstruction::unpack(&ix.pack()).unwrap(), ix);
    }

    #[test]
    fn unpack_rejects_empty_and_unknown() {
        assert!(AuthentikInstruction::unpack(&[]).is_err());
        let err = AuthentikInstruction::unpack(&[7, 0]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidInstruction("unknown Authentik instruction tag 7".into())
        );
    }

    #[test]
    fn oversized_record_never_becomes_an_instruction() {
        let layout = RecordLayout::uri_only(3);
        let err = build_set_record(&[1; 32], &[2; 32], &AccountRecord::new("abcd"), &layout)
            .unwrap_err();
        assert!(matches!(err, RecordError::FieldTooLarge { .. }));
    }
}
