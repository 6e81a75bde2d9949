use std::marker::PhantomData;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FormatError;
use crate::format::Format;

#[derive(Debug)]
pub struct JSON<T>(PhantomData<T>);

impl<T: Serialize + DeserializeOwned> Format for JSON<T> {
    type Item = T;

    fn serialize(v: &T) -> Result<Bytes, FormatError> {
        Ok(Bytes::from(serde_json::to_vec(v)?))
    }

    fn deserialize(v: &[u8]) -> Result<T, FormatError> {
        Ok(serde_json::from_slice(v)?)
    }
}
