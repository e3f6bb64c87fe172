//! Blob Codec
//!
//! Encodes keys and values to opaque byte blobs and back.
//!
//! The format is bincode and is private to this crate: blobs are only ever
//! written and read by the bucket scanner, so no versioning or compression
//! is layered on top. The one contract is round-tripping:
//! `decode(encode(v)) == v` for every representable `v`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Encode a value to its on-disk blob representation.
///
/// Encoding an in-memory value is not expected to fail; when it does (e.g.
/// a serde type that bincode cannot represent), the error is surfaced as
/// [`StoreError::Serialization`].
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a value from its on-disk blob representation.
///
/// Bytes that do not form a valid encoding of `T` surface as
/// [`StoreError::CorruptData`]: the blob came off disk, so a decode failure
/// means the stored entry is damaged, not that the caller passed bad input.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::CorruptData(e.to_string()))
}
