//! Authentik account record codec.
//!
//! An Authentik account holds one [`AccountRecord`]: an NFT URI and, in the
//! extended layout, the mint of the token it describes. The byte layout is
//! structural (borsh-compatible, no tags, no version), so reader and writer
//! must agree on the [`RecordLayout`] out of band.

pub mod codec;
pub mod error;
pub mod record;

pub use codec::{decode, encode};
pub use error::RecordError;
pub use record::{
    register_uri, AccountRecord, RecordLayout, RecordSizePlan, DEFAULT_MAX_URI_LEN, MINT_LEN,
    URI_LEN_PREFIX,
};
