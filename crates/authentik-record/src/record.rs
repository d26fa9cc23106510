//! Record type, layout and reserved-space planning.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Bytes taken by the little-endian `u32` URI length prefix.
pub const URI_LEN_PREFIX: usize = 4;

/// Bytes taken by the optional mint reference.
pub const MINT_LEN: usize = 32;

/// Longest URI the default layout accepts.
pub const DEFAULT_MAX_URI_LEN: usize = 43;

/// The payload stored at an Authentik account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub uri: String,
    pub mint: Option<[u8; 32]>,
}

impl AccountRecord {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mint: None,
        }
    }

    pub fn with_mint(uri: impl Into<String>, mint: [u8; 32]) -> Self {
        Self {
            uri: uri.into(),
            mint: Some(mint),
        }
    }
}

/// The agreed schema for reading and writing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLayout {
    pub max_uri_len: usize,
    pub with_mint: bool,
}

impl RecordLayout {
    pub const fn uri_only(max_uri_len: usize) -> Self {
        Self {
            max_uri_len,
            with_mint: false,
        }
    }

    pub const fn with_mint(max_uri_len: usize) -> Self {
        Self {
            max_uri_len,
            with_mint: true,
        }
    }

    /// Bytes that must be present before any variable-length data.
    pub const fn fixed_prefix_len(&self) -> usize {
        URI_LEN_PREFIX
    }

    pub const fn mint_len(&self) -> usize {
        if self.with_mint {
            MINT_LEN
        } else {
            0
        }
    }

    /// Every byte of the layout except the URI itself.
    pub const fn fixed_overhead(&self) -> usize {
        URI_LEN_PREFIX + self.mint_len()
    }

    /// Space for the longest URI this layout accepts.
    ///
    /// Only an upper bound: prefer [`RecordLayout::plan`], which sizes the
    /// account for the record actually written.
    pub const fn max_space(&self) -> usize {
        self.fixed_overhead() + self.max_uri_len
    }

    /// Reserved space for `record`, checked against the URI bound.
    pub fn plan(&self, record: &AccountRecord) -> Result<RecordSizePlan, RecordError> {
        register_uri(&record.uri, self)
    }

    pub(crate) fn check_uri(&self, uri: &str) -> Result<(), RecordError> {
        if uri.len() > self.max_uri_len {
            return Err(RecordError::FieldTooLarge {
                field: "uri",
                len: uri.len(),
                max: self.max_uri_len,
            });
        }
        Ok(())
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::uri_only(DEFAULT_MAX_URI_LEN)
    }
}

/// How much account space to reserve for a given URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSizePlan {
    pub uri_len: usize,
    /// `fixed_overhead + uri_len`; never smaller than the encoded record.
    pub space: usize,
}

/// Plan the account size for storing `uri` under `layout`.
pub fn register_uri(uri: &str, layout: &RecordLayout) -> Result<RecordSizePlan, RecordError> {
    layout.check_uri(uri)?;
    Ok(RecordSizePlan {
        uri_len: uri.len(),
        space: layout.fixed_overhead() + uri.len(),
    })
}
