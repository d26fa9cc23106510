//! Record wire format.
//!
//! ```text
//! AccountRecord:
//!   uri_len                 u32 LE
//!   uri                     u8 * uri_len (UTF-8)
//!   mint                    32 bytes (only in the mint layout)
//! ```
//!
//! Account buffers are allocated up front and may be longer than the record
//! they hold, so `decode` ignores bytes past the last field.

use crate::error::RecordError;
use crate::record::{AccountRecord, RecordLayout, MINT_LEN, URI_LEN_PREFIX};

/// Serialize `record` under `layout`.
///
/// The record must match the layout: a mint is required exactly when the
/// layout carries one.
pub fn encode(record: &AccountRecord, layout: &RecordLayout) -> Result<Vec<u8>, RecordError> {
    layout.check_uri(&record.uri)?;

    let uri_len = u32::try_from(record.uri.len()).map_err(|_| RecordError::FieldTooLarge {
        field: "uri",
        len: record.uri.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = Vec::with_capacity(layout.fixed_overhead() + record.uri.len());
    buf.extend_from_slice(&uri_len.to_le_bytes());
    buf.extend_from_slice(record.uri.as_bytes());

    match (layout.with_mint, record.mint) {
        (true, Some(mint)) => buf.extend_from_slice(&mint),
        (false, None) => {}
        (true, None) => {
            return Err(RecordError::MalformedField {
                field: "mint",
                reason: "layout requires a mint but the record has none".into(),
            })
        }
        (false, Some(_)) => {
            return Err(RecordError::MalformedField {
                field: "mint",
                reason: "record has a mint but the layout does not store one".into(),
            })
        }
    }

    Ok(buf)
}

/// Deserialize a record from account data laid out as `layout`.
///
/// The URI bound is not enforced here; decoding checks structure only.
pub fn decode(data: &[u8], layout: &RecordLayout) -> Result<AccountRecord, RecordError> {
    let prefix = layout.fixed_prefix_len();
    if data.len() < prefix {
        return Err(RecordError::TruncatedInput {
            needed: prefix,
            got: data.len(),
        });
    }

    let (len_bytes, rest) = data.split_at(URI_LEN_PREFIX);
    let mut len_arr = [0u8; URI_LEN_PREFIX];
    len_arr.copy_from_slice(len_bytes);
    let uri_len = u32::from_le_bytes(len_arr) as usize;

    if uri_len > rest.len() {
        return Err(RecordError::MalformedField {
            field: "uri",
            reason: format!(
                "declared length {uri_len} exceeds remaining {} bytes",
                rest.len()
            ),
        });
    }

    let (uri_bytes, rest) = rest.split_at(uri_len);
    let uri = std::str::from_utf8(uri_bytes)
        .map_err(|e| RecordError::MalformedField {
            field: "uri",
            reason: format!("not UTF-8: {e}"),
        })?
        .to_owned();

    let mint = if layout.with_mint {
        if rest.len() < MINT_LEN {
            return Err(RecordError::TruncatedInput {
                needed: URI_LEN_PREFIX + uri_len + MINT_LEN,
                got: data.len(),
            });
        }
        let mut mint = [0u8; MINT_LEN];
        mint.copy_from_slice(&rest[..MINT_LEN]);
        Some(mint)
    } else {
        None
    };

    Ok(AccountRecord { uri, mint })
}
