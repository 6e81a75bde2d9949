use bytes::Bytes;

use crate::error::FormatError;

pub mod json;

pub use json::JSON;

/// Byte codec for keys and values written to a changelog.
pub trait Format {
    type Item;
    fn serialize(v: &Self::Item) -> Result<Bytes, FormatError>;
    fn deserialize(v: &[u8]) -> Result<Self::Item, FormatError>;
}
